use std::io::{self, Write};

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use amdctl::common::{kernel, CpuIdentity};
use amdctl::{
    report, resolve_profile, AmdctlError, DevicePort, LimitOverrides, OverrideRequest, RunConfig,
    Selection, StateWalker,
};
use amdctl_raw::FamilyProfile;

#[derive(Parser, Debug)]
#[command(name = "amdctl")]
#[command(about = "Read and change P-states on AMD processors (families 10h-19h)")]
#[command(after_help = "WARNING: changing P-states can damage your CPU, use with caution.")]
struct Args {
    #[arg(short = 'g', long, help = "Show P-state information")]
    get: bool,

    #[arg(short = 'c', long, help = "CPU core to work on (all online cores if not set)")]
    core: Option<usize>,

    #[arg(
        short = 'p',
        long,
        help = "P-state register slot to work on, starting at 0 (all if not set)"
    )]
    pstate: Option<usize>,

    #[arg(short = 'v', long, help = "Set CPU voltage in millivolts (1.4 V = 1400)")]
    cpu_voltage: Option<f64>,

    #[arg(short = 'x', long, help = "Set CPU voltage ID directly")]
    cpu_vid: Option<u64>,

    #[arg(short = 'n', long, help = "Set northbridge voltage in millivolts")]
    nb_voltage: Option<f64>,

    #[arg(
        short = 'N',
        long,
        help = "Northbridge P-state to work on (families 15h and 16h)"
    )]
    nb_pstate: Option<usize>,

    #[arg(short = 'f', long, help = "Set CPU frequency ID")]
    cpu_fid: Option<u64>,

    #[arg(short = 'i', long, help = "Set CPU divisor ID")]
    cpu_did: Option<u64>,

    #[arg(
        short = 's',
        long,
        help = "Set CPU clock in MHz, picking FID and DID (families with a 100 MHz shift formula)"
    )]
    frequency: Option<u64>,

    #[arg(short = 'e', long, conflicts_with = "disable", help = "Enable the P-state")]
    enable: bool,

    #[arg(short = 'E', long, help = "Disable the P-state")]
    disable: bool,

    #[arg(short = 'l', long, help = "Set the lowest usable (non boosted) P-state")]
    lowest_pstate: Option<u8>,

    #[arg(short = 'm', long, help = "Set the highest usable (non boosted) P-state")]
    highest_pstate: Option<u8>,

    #[arg(short = 't', long, help = "Preview changes without writing them")]
    preview: bool,

    #[arg(short = 'u', long, help = "Print the voltage ID for a millivolt value and exit")]
    convert: Option<f64>,

    #[arg(short = 'q', long, conflicts_with = "debug", help = "Only log warnings and errors")]
    quiet: bool,

    #[arg(
        short = 'd',
        long,
        help = "Enable debug logging (shows every MSR/PCI read and write)"
    )]
    debug: bool,
}

impl Args {
    fn override_request(&self) -> OverrideRequest {
        OverrideRequest {
            cpu_voltage_mv: self.cpu_voltage,
            cpu_vid: self.cpu_vid,
            nb_voltage_mv: self.nb_voltage,
            cpu_fid: self.cpu_fid,
            cpu_did: self.cpu_did,
            frequency_mhz: self.frequency,
            enable: match (self.enable, self.disable) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
        }
    }

    /// Whether the run has anything to do; a core or P-state selection
    /// alone implies `--get`
    fn has_action(&self) -> bool {
        self.get
            || self.core.is_some()
            || self.pstate.is_some()
            || self.nb_pstate.is_some()
            || self.convert.is_some()
            || self.override_request() != OverrideRequest::default()
            || self.lowest_pstate.is_some()
            || self.highest_pstate.is_some()
    }
}

fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn check_permissions() -> anyhow::Result<()> {
    if !nix::unistd::geteuid().is_root() {
        bail!("amdctl must be run as root");
    }

    let msr_path = "/dev/cpu/0/msr";
    if std::fs::metadata(msr_path).is_err() {
        bail!(
            "Cannot access {msr_path}; the msr kernel module may not be loaded (run: modprobe msr)"
        );
    }

    Ok(())
}

/// Exact-match millivolts to VID for the convert utility
fn convert(profile: &FamilyProfile, millivolts: f64) -> amdctl::Result<u64> {
    profile
        .millivolts_to_vid(millivolts)
        .ok_or(AmdctlError::VoltageNotFound { millivolts })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !args.has_action() {
        Args::command().print_help()?;
        return Ok(());
    }

    init_logging(&args);
    check_permissions()?;

    let identity = CpuIdentity::detect().context("Failed to identify the CPU")?;

    let mut port = DevicePort::new();
    let profile = resolve_profile(&identity, &mut port)?;

    if let Some(millivolts) = args.convert {
        match convert(&profile, millivolts) {
            Ok(vid) => println!("{millivolts} mV = VID {vid} (0x{vid:X})"),
            Err(e) if !e.is_fatal() => println!("{e}"),
            Err(e) => return Err(e.into()),
        }
        return Ok(());
    }

    let config = RunConfig {
        cores: args.core.map_or(Selection::All, Selection::One),
        pstates: args.pstate.map_or(Selection::All, Selection::One),
        overrides: args.override_request().resolve(&profile, args.nb_pstate)?,
        limits: LimitOverrides {
            lowest: args.lowest_pstate,
            highest: args.highest_pstate,
        },
        nb_pstate: args.nb_pstate,
        preview: args.preview,
    };
    config.validate(&profile, &identity.cpus)?;

    if config.writes_requested() && !config.preview {
        kernel::ensure_msr_writes_allowed()?;
    }

    let report = StateWalker::new(&mut port, &profile, &config).run(&identity.cpus)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::render(&report, &profile, &mut out)?;
    out.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("amdctl").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_selection_implies_get() {
        assert!(!parse(&[]).has_action());
        assert!(!parse(&["-t"]).has_action());
        assert!(parse(&["-c", "0"]).has_action());
        assert!(parse(&["-p", "1"]).has_action());
        assert!(parse(&["-N", "0"]).has_action());
        assert!(parse(&["-g"]).has_action());
    }

    #[test]
    fn test_override_request_from_flags() {
        let args = parse(&["-p", "2", "-x", "20", "-E"]);
        let request = args.override_request();
        assert_eq!(request.cpu_vid, Some(20));
        assert_eq!(request.enable, Some(false));
        assert!(args.has_action());
    }
}
