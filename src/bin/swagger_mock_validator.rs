//! swagger-mock-validator: checks a pact file against a Swagger 2 / OpenAPI 3 spec.
//!
//! Usage:
//!   swagger-mock-validator <spec> <mock> [--additional-properties-in-response]
//!                          [--required-properties-in-response]
//!
//! Prints the validation outcome as JSON. Exits 1 when the mock is incompatible and 2 when a
//! document cannot be loaded or parsed.

use anyhow::Context;
use swagger_mock_validator::{loader, ValidationOptions};
use tracing_subscriber::EnvFilter;

const EXIT_INCOMPATIBLE: i32 = 1;
const EXIT_UNUSABLE_INPUT: i32 = 2;

struct Arguments {
    spec: String,
    mock: String,
    options: ValidationOptions,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let arguments = match parse_arguments(&args) {
        Some(arguments) => arguments,
        None => {
            print_usage();
            std::process::exit(EXIT_UNUSABLE_INPUT);
        }
    };

    match run(&arguments).await {
        Ok(success) => {
            if !success {
                std::process::exit(EXIT_INCOMPATIBLE);
            }
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(EXIT_UNUSABLE_INPUT);
        }
    }
}

async fn run(arguments: &Arguments) -> anyhow::Result<bool> {
    let outcome = loader::validate_files(&arguments.mock, &arguments.spec, arguments.options)
        .await
        .with_context(|| {
            format!(
                "unable to validate \"{}\" against \"{}\"",
                arguments.mock, arguments.spec
            )
        })?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(outcome.success)
}

fn parse_arguments(args: &[String]) -> Option<Arguments> {
    let mut positional = Vec::new();
    let mut options = ValidationOptions::default();
    for arg in args {
        match arg.as_str() {
            "--additional-properties-in-response" => {
                options = options.with_additional_properties_in_response(true)
            }
            "--required-properties-in-response" => {
                options = options.with_required_properties_in_response(true)
            }
            "help" | "--help" | "-h" => return None,
            flag if flag.starts_with("--") => {
                eprintln!("Unknown option: {flag}");
                return None;
            }
            value => positional.push(value.to_string()),
        }
    }

    match <[String; 2]>::try_from(positional) {
        Ok([spec, mock]) => Some(Arguments {
            spec,
            mock,
            options,
        }),
        Err(_) => None,
    }
}

fn print_usage() {
    eprintln!(
        r#"swagger-mock-validator {}

USAGE:
    swagger-mock-validator <SPEC> <MOCK> [OPTIONS]

ARGS:
    <SPEC>    Swagger 2 / OpenAPI 3 document (path or http(s) URL, JSON or YAML)
    <MOCK>    Pact file (path or http(s) URL)

OPTIONS:
    --additional-properties-in-response    Allow undeclared properties in response bodies
    --required-properties-in-response      Enforce required properties in response bodies

ENVIRONMENT:
    RUST_LOG    Log filter (default: warn)"#,
        env!("CARGO_PKG_VERSION")
    );
}
