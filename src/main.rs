use clap::Parser;
use pdf_to_docx::cli;

fn main() {
    let args = cli::Args::parse();
    std::process::exit(cli::run(args));
}
