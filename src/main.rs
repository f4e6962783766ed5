#[tokio::main]
async fn main() {
    auth_client::frameworks::app::run().await;
}
