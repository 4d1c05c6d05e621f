use deckscan::cli::run;

fn main() -> anyhow::Result<()> {
    run()
}
