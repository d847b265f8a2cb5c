#[tokio::main]
async fn main() {
    if let Err(e) = pdf_chat_lib::run().await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
