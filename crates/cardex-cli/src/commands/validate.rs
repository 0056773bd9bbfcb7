//! Validate command - run one field validator on a piece of text.

use clap::Args;
use console::style;

use cardex_core::{FieldKind, FieldValidators};

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Field kind (dob, father_name, name, id_number)
    #[arg(value_parser = parse_kind)]
    kind: FieldKind,

    /// Raw recognized text
    text: String,
}

fn parse_kind(s: &str) -> Result<FieldKind, String> {
    FieldKind::from_key(s).ok_or_else(|| {
        format!(
            "unknown field kind '{}', expected one of: {}",
            s,
            super::output::join_keys(&FieldKind::ALL)
        )
    })
}

pub async fn run(args: ValidateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let validators = FieldValidators::from_config(&config.extraction);

    let candidate = validators.candidate(args.kind, &args.text);
    if !candidate.valid {
        anyhow::bail!(
            "Not a valid {}: {:?} (cleaned: {:?})",
            args.kind.label(),
            args.text,
            candidate.value
        );
    }

    eprintln!("{} Valid {}", style("✓").green(), args.kind.label());
    println!("{}", candidate.value);

    Ok(())
}
