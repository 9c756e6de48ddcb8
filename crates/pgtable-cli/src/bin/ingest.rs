#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    pgtable_cli::logging::init();

    if let Err(e) = pgtable_cli::run_ingest(std::env::args().collect()).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
