#[actix_web::main]
async fn main() -> std::io::Result<()> {
    presupuesto_server::run().await
}
