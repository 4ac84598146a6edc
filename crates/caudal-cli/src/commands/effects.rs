//! Effect listing command.

use clap::Args;

use caudal_registry::EffectRegistry;

#[derive(Args)]
pub struct EffectsArgs {
    /// Show only this effect
    #[arg(value_name = "NAME")]
    name: Option<String>,
}

pub fn run(args: EffectsArgs) -> anyhow::Result<()> {
    let registry = EffectRegistry::new();

    if let Some(name) = &args.name {
        let Some(descriptor) = registry.lookup(name) else {
            anyhow::bail!("unknown effect '{name}'");
        };
        println!("{}", descriptor.name);
        println!("  {}", descriptor.description);
        println!("  usage: {}", descriptor.usage);
        print_caps(descriptor.caps);
        return Ok(());
    }

    println!("Available effects ({}):", registry.len());
    for descriptor in registry.all_effects() {
        println!("  {:10} {}", descriptor.name, descriptor.description);
    }
    println!("\nRun `caudal effects NAME` for usage details.");
    Ok(())
}

fn print_caps(caps: caudal_core::Caps) {
    let mut notes = Vec::new();
    if caps.changes_channels {
        notes.push("changes channel count");
    }
    if caps.changes_rate {
        notes.push("changes sample rate");
    }
    if caps.multichannel {
        notes.push("handles interleaved multichannel");
    } else {
        notes.push("runs per-channel on stereo");
    }
    if caps.report_only {
        notes.push("report only");
    }
    if caps.null_op {
        notes.push("no-op");
    }
    println!("  {}", notes.join(", "));
}
