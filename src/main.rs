#[tokio::main]
async fn main() -> anyhow::Result<()> {
    emolens_lib::run().await
}
