//! Effect-chain specification parsing.
//!
//! A chain is written as pipe-separated effect entries, each an effect name
//! optionally followed by a colon and comma-separated arguments:
//!
//! ```text
//! vol:-6|echo:0.8,0.9,250,0.4|lowpass:3000
//! ```

use caudal_core::EffectHandler;
use caudal_registry::EffectRegistry;

/// Parse a chain specification into configured effect handlers.
pub fn parse_chain(
    spec: &str,
    registry: &EffectRegistry,
) -> anyhow::Result<Vec<Box<dyn EffectHandler + Send>>> {
    let mut effects = Vec::new();
    for entry in spec.split('|') {
        let entry = entry.trim();
        if entry.is_empty() {
            anyhow::bail!("empty effect entry in chain '{spec}'");
        }
        let (name, args) = match entry.split_once(':') {
            Some((name, rest)) => {
                let args: Vec<String> = rest
                    .split(',')
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .collect();
                (name.trim(), args)
            }
            None => (entry, Vec::new()),
        };
        let effect = registry.create(name, &args)?;
        effects.push(effect);
    }
    Ok(effects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_arguments() {
        let registry = EffectRegistry::new();
        let chain = parse_chain("vol:-6|echo:0.8,0.9,250,0.4|reverse", &registry).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].name(), "vol");
        assert_eq!(chain[1].name(), "echo");
        assert_eq!(chain[2].name(), "reverse");
    }

    #[test]
    fn unknown_effect_fails() {
        let registry = EffectRegistry::new();
        assert!(parse_chain("chorus:1", &registry).is_err());
    }

    #[test]
    fn bad_arguments_fail() {
        let registry = EffectRegistry::new();
        assert!(parse_chain("vol:loud", &registry).is_err());
    }

    #[test]
    fn empty_entries_are_rejected() {
        let registry = EffectRegistry::new();
        assert!(parse_chain("vol:-6||reverse", &registry).is_err());
    }
}
