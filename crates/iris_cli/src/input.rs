//! Interactive input collection

use anyhow::Result;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use iris_core::inference::parse_number;
use iris_core::RawInput;

/// Ask once per feature, in model order. Values are validated afterwards by
/// the predictor, which reports every bad field together.
pub(crate) fn prompt_plain(columns: &[String]) -> Result<RawInput> {
    eprintln!("Enter 4 values (floats) in this order:");
    eprintln!("{}", columns.join(", "));

    let mut values = Vec::with_capacity(columns.len());
    for column in columns {
        let value: String = Input::new().with_prompt(column).interact_text()?;
        values.push(value);
    }
    Ok(RawInput::Positional(values))
}

/// Ask once per feature, re-prompting until the text parses as a number.
pub(crate) fn prompt_validated(columns: &[String]) -> Result<RawInput> {
    eprintln!("{} {}", "Feature order:".bold(), columns.join(", "));

    let theme = ColorfulTheme::default();
    let mut values = Vec::with_capacity(columns.len());
    for column in columns {
        let value: String = Input::with_theme(&theme)
            .with_prompt(format!("{column} (e.g. 5.1)"))
            .validate_with(|text: &String| -> Result<(), &str> {
                parse_number(text)
                    .map(|_| ())
                    .ok_or("invalid value, type a number (point or comma as decimal separator)")
            })
            .interact_text()?;
        values.push(value);
    }
    Ok(RawInput::Positional(values))
}
