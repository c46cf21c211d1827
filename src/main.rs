//! csv-scout CLI - delimited-text dialect sniffer

use clap::Parser;
use csv_scout::{
    EnquotePolicy, Metadata, Quote, SampleSize, Sniffer, WriterBuilder,
};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::process::ExitCode;
use tracing::Level;

/// Guess the separator, quote, escape and comment prefix of delimited text
/// files, and optionally rewrite a file in a normalized dialect.
#[derive(Parser, Debug)]
#[command(name = "csv-scout")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file(s) or http(s) URL(s) to sniff
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Number of records to sample (default: 100)
    #[arg(short = 'n', long, default_value = "100")]
    sample_records: usize,

    /// Number of bytes to sample (overrides --sample-records)
    #[arg(short = 'b', long)]
    sample_bytes: Option<usize>,

    /// Read entire file instead of sampling
    #[arg(short = 'a', long)]
    all: bool,

    /// Report nothing rather than an unverified guess
    #[arg(long)]
    strict: bool,

    /// Candidate separators, in order of preference (e.g. ",;|")
    #[arg(short = 's', long)]
    separators: Option<String>,

    /// Candidate quote characters, in order of preference
    #[arg(short = 'q', long)]
    quotes: Option<String>,

    /// Output format: text (default), json, or csv
    #[arg(short = 'f', long, default_value = "text")]
    format: OutputFormat,

    /// Show the ranked candidates and debug logs
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Only output the detected separator character
    #[arg(long)]
    delimiter_only: bool,

    /// Rewrite the first input to stdout in a normalized dialect
    #[arg(long)]
    rewrite: bool,

    /// Separator used by --rewrite (default: the detected one)
    #[arg(long, requires = "rewrite")]
    out_separator: Option<char>,

    /// Quote every field when rewriting
    #[arg(long, requires = "rewrite")]
    always_quote: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let sniffer = match build_sniffer(&args) {
        Ok(sniffer) => sniffer,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.rewrite {
        let input = &args.inputs[0];
        return match rewrite(input, &sniffer, &args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error rewriting {input}: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let mut exit_code = ExitCode::SUCCESS;
    for (i, input) in args.inputs.iter().enumerate() {
        match sniff_input(input, &sniffer) {
            Ok(metadata) => report(input, &metadata, &args, i == 0),
            Err(e) => {
                eprintln!("Error processing {input}: {e}");
                exit_code = ExitCode::FAILURE;
            }
        }
    }
    exit_code
}

fn build_sniffer(args: &Args) -> CliResult<Sniffer> {
    let mut sniffer = Sniffer::new();
    if args.all {
        sniffer.sample_size(SampleSize::All);
    } else if let Some(bytes) = args.sample_bytes {
        sniffer.sample_size(SampleSize::Bytes(bytes));
    } else {
        sniffer.sample_size(SampleSize::Records(args.sample_records));
    }
    if let Some(separators) = &args.separators {
        sniffer.separators(&ascii_bytes(separators, "separators")?);
    }
    if let Some(quotes) = &args.quotes {
        sniffer.quotes(&ascii_bytes(quotes, "quotes")?);
    }
    sniffer.strict(args.strict);
    Ok(sniffer)
}

fn ascii_bytes(chars: &str, what: &str) -> CliResult<Vec<u8>> {
    // "\t" typed literally on the command line
    let chars = chars.replace("\\t", "\t");
    if !chars.is_ascii() {
        return Err(format!("{what} must be ASCII characters").into());
    }
    Ok(chars.into_bytes())
}

#[cfg(feature = "http")]
fn sniff_input(input: &str, sniffer: &Sniffer) -> csv_scout::Result<Metadata> {
    if csv_scout::http::is_url(input) {
        sniffer.sniff_url(input)
    } else {
        sniffer.sniff_path(input)
    }
}

#[cfg(not(feature = "http"))]
fn sniff_input(input: &str, sniffer: &Sniffer) -> csv_scout::Result<Metadata> {
    sniffer.sniff_path(input)
}

/// Re-emit `input` through the tokenizer and the writer.
fn rewrite(input: &str, sniffer: &Sniffer, args: &Args) -> CliResult<()> {
    let metadata = sniffer.sniff_path(input)?;
    let mut reader = BufReader::new(File::open(input)?);
    io::copy(
        &mut (&mut reader).take(metadata.preamble_len as u64),
        &mut io::sink(),
    )?;

    let separator = match args.out_separator {
        Some(c) if c.is_ascii() => c as u8,
        Some(c) => return Err(format!("separator {c:?} is not ASCII").into()),
        None => metadata.dialect.separator.unwrap_or(b','),
    };
    let mut builder = WriterBuilder::new();
    builder
        .separator(separator)
        .quote(match metadata.dialect.quote {
            Quote::Some(q) if q != separator => Quote::Some(q),
            _ => Quote::Some(b'"'),
        })
        .comment(&metadata.dialect.comment)
        .enquote(if args.always_quote {
            EnquotePolicy::Always
        } else {
            EnquotePolicy::Minimal
        });
    let mut writer = builder.from_writer(io::stdout().lock())?;

    let mut tok = metadata.tokenizer(reader)?;
    while tok.advance() {
        let field = tok.field();
        if field.is_comment() {
            writer.write_comment(field.bytes())?;
        } else if field.is_empty_line() {
            writer.empty_row()?;
        } else {
            writer.write_field(field.bytes())?;
            if field.at_row_end() {
                writer.new_row()?;
            }
        }
    }
    if let Some(err) = tok.error() {
        return Err(err.clone().into());
    }
    writer.flush()?;
    Ok(())
}

fn report(input: &str, metadata: &Metadata, args: &Args, first: bool) {
    if args.delimiter_only {
        println!("{}", separator_label(metadata.dialect.separator));
        return;
    }
    match args.format {
        OutputFormat::Text => print_text_output(input, metadata, args.verbose),
        OutputFormat::Json => print_json_output(input, metadata, args.verbose),
        OutputFormat::Csv => print_csv_output(input, metadata, first),
    }
}

fn separator_label(separator: Option<u8>) -> String {
    match separator {
        Some(b'\t') => "\\t".to_string(),
        Some(b) => (b as char).to_string(),
        None => "none".to_string(),
    }
}

fn byte_label(byte: Option<u8>) -> String {
    match byte {
        Some(b) => format!("{:?}", b as char),
        None => "none".to_string(),
    }
}

fn print_text_output(input: &str, metadata: &Metadata, verbose: bool) {
    let dialect = &metadata.dialect;
    println!("File: {input}");
    println!("  Separator: {}", byte_label(dialect.separator));
    println!("  Quote: {}", byte_label(dialect.quote.char()));
    println!("  Escape: {}", byte_label(dialect.escape));
    println!(
        "  Comment: {}",
        if dialect.comment.is_empty() {
            "none".to_string()
        } else {
            format!("{:?}", String::from_utf8_lossy(&dialect.comment))
        }
    );
    println!("  Verified: {}", metadata.verified);
    println!("  Preamble: {} bytes", metadata.preamble_len);
    println!("  BOM: {}", metadata.has_bom);
    println!("  UTF-8: {}", metadata.is_utf8);

    if verbose {
        println!("  Candidates:");
        for score in &metadata.scores {
            println!("    {score}");
        }
    }
    println!();
}

/// JSON string literal, or `null`.
fn json_string(value: Option<&[u8]>) -> String {
    let Some(value) = value else {
        return "null".to_string();
    };
    let mut out = String::from("\"");
    for c in String::from_utf8_lossy(value).chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn print_json_output(input: &str, metadata: &Metadata, verbose: bool) {
    let dialect = &metadata.dialect;
    let byte = |b: Option<u8>| json_string(b.as_ref().map(std::slice::from_ref));
    let comment = (!dialect.comment.is_empty()).then_some(dialect.comment.as_slice());

    print!(
        r#"{{"file":{},"dialect":{{"separator":{},"quote":{},"escape":{},"comment":{}}},"verified":{},"preamble_len":{},"has_bom":{},"is_utf8":{}"#,
        json_string(Some(input.as_bytes())),
        byte(dialect.separator),
        byte(dialect.quote.char()),
        byte(dialect.escape),
        json_string(comment),
        metadata.verified,
        metadata.preamble_len,
        metadata.has_bom,
        metadata.is_utf8,
    );

    if verbose {
        print!(r#","candidates":["#);
        for (i, score) in metadata.scores.iter().enumerate() {
            if i > 0 {
                print!(",");
            }
            print!(
                r#"{{"separator":{},"quote":{},"score":{}}}"#,
                byte(score.separator),
                byte(score.quote.char()),
                score.score
            );
        }
        print!("]");
    }
    println!("}}");
}

fn print_csv_output(input: &str, metadata: &Metadata, header: bool) {
    let dialect = &metadata.dialect;
    let plain = |b: Option<u8>| b.map(|b| (b as char).to_string()).unwrap_or_default();

    let mut out = match WriterBuilder::new().from_writer(io::stdout().lock()) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(2);
    if header {
        rows.push(
            [
                "file",
                "separator",
                "quote",
                "escape",
                "comment",
                "verified",
                "preamble_len",
                "has_bom",
                "is_utf8",
            ]
            .map(String::from)
            .to_vec(),
        );
    }
    rows.push(vec![
        input.to_string(),
        plain(dialect.separator),
        plain(dialect.quote.char()),
        plain(dialect.escape),
        String::from_utf8_lossy(&dialect.comment).into_owned(),
        metadata.verified.to_string(),
        metadata.preamble_len.to_string(),
        metadata.has_bom.to_string(),
        metadata.is_utf8.to_string(),
    ]);

    let written = rows.iter().try_for_each(|row| {
        row.iter()
            .try_for_each(|field| out.write_field(field.as_bytes()))?;
        out.new_row()
    });
    if let Err(e) = written.and_then(|()| out.flush()) {
        eprintln!("Error: {e}");
    }
}
