#[tokio::main(flavor = "current_thread")]
async fn main() {
    pgtable_cli::logging::init();

    if let Err(e) = pgtable_cli::run_crud(std::env::args().collect()).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
