#[actix_web::main]
async fn main() -> std::io::Result<()> {
    sheetsense::app::run().await
}
