//! Scripted input for headless runs.
//!
//! A script is a list of commands separated by `;` or newlines:
//!
//! ```text
//! walk 1.5; strafe -0.5; yaw 90; pitch -15; grow; wireframe
//! ```
//!
//! Angles are in degrees.

use anyhow::{Context, Result, bail};
use treecrown_common::FillMode;
use treecrown_input::Action;

pub fn parse(script: &str) -> Result<Vec<Action>> {
    script
        .split([';', '\n'])
        .map(str::trim)
        .filter(|cmd| !cmd.is_empty())
        .map(parse_command)
        .collect()
}

fn parse_command(cmd: &str) -> Result<Action> {
    let mut parts = cmd.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let arg = parts.next();
    if parts.next().is_some() {
        bail!("too many arguments in `{cmd}`");
    }

    let number = || -> Result<f32> {
        let text = arg.with_context(|| format!("`{name}` needs a number"))?;
        let value: f32 = text
            .parse()
            .with_context(|| format!("`{text}` is not a number"))?;
        if !value.is_finite() {
            bail!("`{text}` is not finite");
        }
        Ok(value)
    };
    let no_arg = |action: Action| -> Result<Action> {
        match arg {
            Some(extra) => bail!("`{name}` takes no argument, got `{extra}`"),
            None => Ok(action),
        }
    };

    match name.as_str() {
        "walk" => Ok(Action::Walk(number()?)),
        "strafe" => Ok(Action::Strafe(number()?)),
        "pitch" => Ok(Action::Pitch(number()?.to_radians())),
        "yaw" => Ok(Action::Yaw(number()?.to_radians())),
        "grow" => no_arg(Action::GrowStep),
        "reset" => no_arg(Action::ResetGrowth),
        "wireframe" => no_arg(Action::SetFillMode(FillMode::Wireframe)),
        "solid" => no_arg(Action::SetFillMode(FillMode::Solid)),
        other => bail!("unknown command `{other}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_script() {
        let actions = parse("walk 1.5; Strafe -0.5\nyaw 90;; grow; wireframe").unwrap();
        assert_eq!(actions.len(), 5);
        assert_eq!(actions[0], Action::Walk(1.5));
        assert_eq!(actions[1], Action::Strafe(-0.5));
        match actions[2] {
            Action::Yaw(a) => assert!((a - std::f32::consts::FRAC_PI_2).abs() < 1e-6),
            other => panic!("expected yaw, got {other:?}"),
        }
        assert_eq!(actions[3], Action::GrowStep);
        assert_eq!(actions[4], Action::SetFillMode(FillMode::Wireframe));
    }

    #[test]
    fn empty_script_is_empty() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse(" ; \n ").unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_commands() {
        assert!(parse("fly 2").is_err());
        assert!(parse("walk").is_err());
        assert!(parse("walk far").is_err());
        assert!(parse("walk inf").is_err());
        assert!(parse("walk 1 2").is_err());
        assert!(parse("grow 3").is_err());
    }
}
