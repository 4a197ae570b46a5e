// Plain-text rendering of a walk report

use std::io::{self, Write};

use amdctl_raw::FamilyProfile;

use crate::metrics::{NbPStateRow, PStateRow, Report};

const PSTATE_HEADER: &str =
    "  P-state  En  FID   DID   VID   CPU mV   NB VID  NB mV    MHz      Mult    Amps    Watts";

/// Write `report` as a table per core, followed by the northbridge P-states
pub fn render<W: Write>(
    report: &Report,
    profile: &FamilyProfile,
    out: &mut W,
) -> io::Result<()> {
    writeln!(
        out,
        "Family {} model {:X}h, {} voltage IDs",
        report.family,
        report.model,
        profile.voltage.name()
    )?;
    if report.preview {
        writeln!(out, "Preview mode: values below were not written")?;
    }

    for core in &report.cores {
        writeln!(out)?;
        writeln!(
            out,
            "Core {}  current P{}  limits P{}-P{}",
            core.core,
            profile.display_index(usize::from(core.current_index)),
            profile.display_index(usize::from(core.limit.cur_limit)),
            profile.display_index(usize::from(core.limit.max_value))
        )?;
        writeln!(out, "{PSTATE_HEADER}")?;
        for row in &core.pstates {
            write_pstate_row(out, profile, row)?;
        }
        if let Some(current) = &core.current {
            write_pstate_row(out, profile, current)?;
        }
    }

    if !report.northbridge.is_empty() {
        writeln!(out)?;
        writeln!(out, "Northbridge")?;
        writeln!(out, "  NB P-state  En  FID   DID   VID   mV       MHz")?;
        for row in &report.northbridge {
            write_nb_row(out, row)?;
        }
    }

    Ok(())
}

fn write_pstate_row<W: Write>(
    out: &mut W,
    profile: &FamilyProfile,
    row: &PStateRow,
) -> io::Result<()> {
    let label = match row.slot {
        Some(slot) => format!("P{}", profile.display_index(slot)),
        None => "current".to_string(),
    };
    let enabled = match row.fields.enabled {
        Some(true) => "y",
        Some(false) => "n",
        None => "-",
    };

    writeln!(
        out,
        "  {:<7}  {:<2}  {:<4}  {:<4}  {:<4}  {:<7}  {:<6}  {:<7}  {:<7}  {:<6}  {:<6}  {}",
        label,
        enabled,
        row.fields.cpu_fid,
        row.fields.cpu_did,
        row.fields.cpu_vid,
        format!("{:.2}", row.metrics.millivolts),
        optional_u64(row.fields.nb_vid),
        optional(row.metrics.nb_millivolts, 2),
        optional(row.metrics.clock_mhz, 0),
        optional(row.metrics.multiplier, 2),
        optional(row.metrics.current_amps, 2),
        optional(row.metrics.power_watts, 2),
    )
}

fn write_nb_row<W: Write>(out: &mut W, row: &NbPStateRow) -> io::Result<()> {
    writeln!(
        out,
        "  {:<10}  {:<2}  {:<4}  {:<4}  {:<4}  {:<7}  {}",
        row.index,
        if row.enabled { "y" } else { "n" },
        row.fid,
        row.did,
        row.vid,
        format!("{:.2}", row.millivolts),
        optional(row.clock_mhz, 0),
    )
}

fn optional(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

fn optional_u64(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::CoreReport;
    use amdctl_raw::msr::PStateLimit;
    use amdctl_raw::RegisterImage;

    fn render_to_string(report: &Report, profile: &FamilyProfile) -> String {
        let mut out = Vec::new();
        render(report, profile, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_one_based_labels() {
        let profile = FamilyProfile::for_cpu(0x11, 0x03, None).unwrap();
        let image = RegisterImage::new(0)
            .with(profile.layout.enable, 1)
            .with(profile.layout.cpu_vid, 12)
            .with(profile.layout.idd_div, 3);
        let mut report = Report::new(profile.family, profile.model, true);
        report.cores.push(CoreReport {
            core: 3,
            limit: PStateLimit {
                cur_limit: 0,
                max_value: 2,
            },
            current_index: 1,
            pstates: vec![PStateRow::from_pstate(&profile, 0, image)],
            current: Some(PStateRow::from_status(&profile, image)),
        });

        let text = render_to_string(&report, &profile);
        assert!(text.contains("Preview mode"));
        assert!(text.contains("Core 3  current P2  limits P1-P3"));
        assert!(text.contains("  P1 "));
        assert!(text.contains("1400.00"));
        assert!(text.contains("current"));
    }

    #[test]
    fn test_zero_based_labels() {
        let profile = FamilyProfile::for_cpu(0x17, 0x71, None).unwrap();
        let mut report = Report::new(profile.family, profile.model, false);
        report.cores.push(CoreReport {
            core: 0,
            limit: PStateLimit::default(),
            current_index: 0,
            pstates: vec![PStateRow::from_pstate(
                &profile,
                0,
                RegisterImage::new(0x8000_0000_0000_0888),
            )],
            current: None,
        });

        let text = render_to_string(&report, &profile);
        assert!(text.contains("Core 0  current P0  limits P0-P0"));
        assert!(text.contains("  P0 "));
        assert!(!text.contains("Preview mode"));
        assert!(!text.contains("Northbridge"));
    }
}
