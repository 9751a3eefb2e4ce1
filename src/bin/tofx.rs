use std::io::Write;

fn main() {
    tofx::tracing::setup_tracing();
    if tofx::app::run().is_err() {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
        std::process::exit(1);
    }
}
