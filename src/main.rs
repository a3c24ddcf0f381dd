#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    invoice_pdf_server::run().await
}
