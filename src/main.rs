use clap::{Parser, ValueEnum};
use docx_signature::{Fallback, Labels, Layout, SignOptions, SignRequest, SignatureSlot};
use std::path::PathBuf;

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Table,
    Paragraph,
}

#[derive(Clone, Copy, ValueEnum)]
enum Lang {
    En,
    Es,
}

#[derive(Parser)]
#[command(name = "sign-document", about = "Stamp a signature block into the footer of a DOCX file")]
struct Args {
    /// Input DOCX file
    input: PathBuf,
    /// Signature image (PNG/JPEG/...); pass "" to sign with text only
    signature: String,
    /// Output DOCX file (its directory is created if missing)
    output: PathBuf,
    /// Name of the person signing
    signer: String,
    /// Footer layout
    #[arg(long, value_enum, default_value = "table")]
    layout: LayoutArg,
    /// Language of the fixed labels
    #[arg(long, value_enum, default_value = "en")]
    lang: Lang,
    /// Table style to apply when the document defines it
    #[arg(long, default_value = "Table Grid")]
    table_style: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if !args.input.exists() {
        eprintln!("Error: file not found: {}", args.input.display());
        std::process::exit(1);
    }
    if !args.input.is_file() {
        eprintln!("Error: not a file: {}", args.input.display());
        std::process::exit(1);
    }

    let labels = match args.lang {
        Lang::En => Labels::english(),
        Lang::Es => Labels::spanish(),
    };
    let image = Some(args.signature.trim())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);
    let now = chrono::Local::now().naive_local();

    let (layout, slots) = match args.layout {
        LayoutArg::Table => (
            Layout::Table,
            SignatureSlot::standard_set(&args.signer, image, now.date(), &labels),
        ),
        LayoutArg::Paragraph => (
            Layout::Paragraph,
            vec![SignatureSlot::signer(&args.signer, image, now, &labels)],
        ),
    };

    let options = SignOptions { layout, table_style: args.table_style, labels, ..SignOptions::default() };
    let request = SignRequest { input: args.input, output: args.output, slots };

    match docx_signature::sign_document(&request, &options) {
        Ok(report) => {
            // Slots without an image are the normal case for pending signers.
            let notes = report
                .composition
                .fallbacks
                .iter()
                .filter(|f| !matches!(f, Fallback::NoImage { .. }));
            for fallback in notes {
                println!("Note: {fallback}");
            }
            println!(
                "Signed document saved to {} ({:.2} KB)",
                report.output.display(),
                report.size_bytes as f64 / 1024.0
            );
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
