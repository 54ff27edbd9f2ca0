use crate::core::AddressController;
use crate::domain::model::{Dropdown, FormState, InputMode};
use crate::domain::ports::LocalityLookup;
use crate::utils::error::{Result, ValidatorError};
use std::fmt::Write as _;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub const HELP_TEXT: &str = "\
Commands:
  city <text>        type into the city field
  plz <digits>       type into the postal code field
  pick city <name>   choose a city from the suggestions
  pick plz <code>    choose a postal code from the options
  focus plz          focus the postal code field
  esc                close open dropdowns
  show               print the form
  help               print this help
  quit               exit
";

/// One line of terminal input, the equivalent of a keystroke or click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormCommand {
    City(String),
    PostalCode(String),
    PickCity(String),
    PickPostalCode(String),
    FocusPostalCode,
    Dismiss,
    Show,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<FormCommand> {
    let line = line.trim();
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match verb.to_lowercase().as_str() {
        "city" => FormCommand::City(rest.to_string()),
        "plz" | "postal" => FormCommand::PostalCode(rest.to_string()),
        "pick" | "select" => {
            let (target, value) = rest.split_once(' ').unwrap_or((rest, ""));
            let value = value.trim();
            if value.is_empty() {
                return Err(ValidatorError::ValidationError {
                    message: "pick needs a target and a value, e.g. `pick city Berlin`".to_string(),
                });
            }
            match target {
                "city" => FormCommand::PickCity(value.to_string()),
                "plz" | "postal" => FormCommand::PickPostalCode(value.to_string()),
                other => {
                    return Err(ValidatorError::ValidationError {
                        message: format!("Unknown pick target: {}", other),
                    })
                }
            }
        }
        "focus" if rest == "plz" || rest == "postal" => FormCommand::FocusPostalCode,
        "esc" | "escape" => FormCommand::Dismiss,
        "show" => FormCommand::Show,
        "help" | "?" => FormCommand::Help,
        "quit" | "exit" => FormCommand::Quit,
        _ => {
            return Err(ValidatorError::ValidationError {
                message: format!("Unknown command: {}", line),
            })
        }
    };

    Ok(command)
}

pub fn render(state: &FormState) -> String {
    let marker = |mode: InputMode| if state.mode == mode { ">" } else { " " };
    let mut out = String::new();

    let _ = writeln!(out, "── German Address Validator ──");
    let _ = writeln!(out, "{} City:        {}", marker(InputMode::EditingCity), state.city_text);
    let _ = writeln!(
        out,
        "{} Postal code: {}",
        marker(InputMode::EditingPostalCode),
        state.postal_code_text
    );

    match state.open_dropdown() {
        Some(Dropdown::CitySuggestions) => {
            for name in state.city_names() {
                let _ = writeln!(out, "    ▸ {}", name);
            }
        }
        Some(Dropdown::PostalCodeOptions) => {
            for code in &state.postal_code_options {
                let selected = if *code == state.postal_code_text { "*" } else { " " };
                let _ = writeln!(out, "    ▸{}{}", selected, code);
            }
        }
        None => {}
    }

    if let Some(error) = &state.error {
        let _ = writeln!(out, "  ❌ {}", error.message);
    } else if state.selection_confirmed && !state.postal_code_text.is_empty() {
        let _ = writeln!(out, "  ✅ {} {}", state.postal_code_text, state.city_text);
    }

    out
}

fn apply_command<L: LocalityLookup + 'static>(
    controller: &mut AddressController<L>,
    command: FormCommand,
) -> bool {
    match command {
        FormCommand::City(text) => controller.on_city_text_changed(text),
        FormCommand::PostalCode(text) => controller.on_postal_code_text_changed(&text),
        FormCommand::PickCity(name) => return controller.on_city_selected(&name),
        FormCommand::PickPostalCode(code) => return controller.on_postal_code_selected(&code),
        FormCommand::FocusPostalCode => controller.on_postal_code_focused(),
        FormCommand::Dismiss => controller.dismiss_dropdowns(),
        FormCommand::Show | FormCommand::Help | FormCommand::Quit => {}
    }
    true
}

/// Drives the controller from line-based input until `quit` or end of input,
/// reprinting the form whenever it changes.
pub async fn run_session<L, R, W>(
    controller: &mut AddressController<L>,
    input: R,
    output: &mut W,
) -> Result<()>
where
    L: LocalityLookup + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    output.write_all(render(controller.state()).as_bytes()).await?;
    output.flush().await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // 輸入結束：等待最後一次查詢完成
                    controller.settle().await;
                    output.write_all(render(controller.state()).as_bytes()).await?;
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match parse_command(&line) {
                    Ok(FormCommand::Quit) => break,
                    Ok(FormCommand::Help) => output.write_all(HELP_TEXT.as_bytes()).await?,
                    Ok(FormCommand::Show) => {
                        output.write_all(render(controller.state()).as_bytes()).await?
                    }
                    Ok(command) => {
                        tracing::debug!("Command: {:?}", command);
                        if apply_command(controller, command) {
                            output.write_all(render(controller.state()).as_bytes()).await?;
                        } else {
                            output.write_all(b"  (not an available choice)\n").await?;
                        }
                    }
                    Err(e) => {
                        output.write_all(format!("  {}\n", e).as_bytes()).await?;
                    }
                }
            }
            changed = controller.process_next() => {
                if changed {
                    output.write_all(render(controller.state()).as_bytes()).await?;
                }
            }
        }
        output.flush().await?;
    }

    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FormError, Locality};
    use crate::utils::error::ErrorKind;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("city Frankfurt am Main").unwrap(),
            FormCommand::City("Frankfurt am Main".to_string())
        );
        assert_eq!(
            parse_command("plz 80331").unwrap(),
            FormCommand::PostalCode("80331".to_string())
        );
        assert_eq!(
            parse_command("pick city Bad Homburg").unwrap(),
            FormCommand::PickCity("Bad Homburg".to_string())
        );
        assert_eq!(
            parse_command("pick plz 10117").unwrap(),
            FormCommand::PickPostalCode("10117".to_string())
        );
        assert_eq!(parse_command("focus plz").unwrap(), FormCommand::FocusPostalCode);
        assert_eq!(parse_command("ESC").unwrap(), FormCommand::Dismiss);
        assert_eq!(parse_command("city").unwrap(), FormCommand::City(String::new()));
    }

    #[test]
    fn test_parse_rejects_unknown_input() {
        assert!(parse_command("dance").is_err());
        assert!(parse_command("pick city").is_err());
        assert!(parse_command("pick street Hauptstraße").is_err());
    }

    #[test]
    fn test_render_city_suggestions_and_error() {
        let state = FormState {
            city_text: "Fra".to_string(),
            city_suggestions: vec![
                Locality::new("Frankfurt am Main", "60311"),
                Locality::new("Frankenthal", "67227"),
            ],
            mode: InputMode::EditingCity,
            ..FormState::default()
        };

        let out = render(&state);
        assert!(out.contains("> City:        Fra"));
        assert!(out.contains("▸ Frankfurt am Main"));
        assert!(out.contains("▸ Frankenthal"));

        let state = FormState {
            error: Some(FormError::new(ErrorKind::Validation, "Postal code must be 5 digits.")),
            ..FormState::default()
        };
        assert!(render(&state).contains("❌ Postal code must be 5 digits."));
    }

    #[test]
    fn test_render_confirmed_address() {
        let state = FormState {
            city_text: "Potsdam".to_string(),
            postal_code_text: "14467".to_string(),
            selection_confirmed: true,
            mode: InputMode::EditingCity,
            ..FormState::default()
        };

        assert!(render(&state).contains("✅ 14467 Potsdam"));
    }
}
