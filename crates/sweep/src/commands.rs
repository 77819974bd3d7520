//! Subcommand handlers.

use miette::{IntoDiagnostic, Result};
use sweep_cli::{CheckArgs, ParamsArgs, ScriptsArgs};
use sweep_matrix::{ParamWriter, write_param_files};
use sweep_scan::{JobStatus, scan_jobs, write_script};
use sweep_scripts::{ScriptGenerator, SweepConfig};

/// Enumerate matrices and print the parameter files written.
pub fn params(args: &ParamsArgs) -> Result<()> {
    let enumeration = args.enumeration_params().into_diagnostic()?;
    let c_matrix = args.c_matrix().into_diagnostic()?;
    let writer = ParamWriter::new(args.output_dir.clone(), args.name.clone())
        .overwrite(!args.no_overwrite);

    let paths = write_param_files(&enumeration, c_matrix.as_ref(), &args.hidden, &writer)
        .into_diagnostic()?;

    if paths.is_empty() {
        eprintln!("No matrices satisfy the given constraints");
    }
    for path in &paths {
        println!("{}", path);
    }
    Ok(())
}

/// Generate job scripts for every parameter file.
pub fn scripts(args: &ScriptsArgs) -> Result<()> {
    let config = SweepConfig::from_path(&args.config).into_diagnostic()?;
    let generator = ScriptGenerator::new(&config);

    for (i, param_file) in args.params.iter().enumerate() {
        let prefix = format!("{}_{}", config.prefix_output, i + 1);
        let jobs = generator
            .generate_all(param_file, &prefix)
            .into_diagnostic()?;
        for job in &jobs {
            println!("{}", job.run_script);
        }
    }
    Ok(())
}

/// Scan for failed jobs and write the resubmission script.
pub fn check(args: &CheckArgs) -> Result<()> {
    let report = scan_jobs(&args.dir).into_diagnostic()?;

    if args.report {
        for job in &report.jobs {
            let status = match job.status {
                JobStatus::NeverRan => "never ran".to_string(),
                JobStatus::Errored { bytes } => format!("errored ({} bytes on stderr)", bytes),
                JobStatus::Succeeded => "ok".to_string(),
            };
            println!("{}\t{}", job.submission, status);
        }
    }

    write_script(&report.rerun, &args.output).into_diagnostic()?;

    eprintln!(
        "{} of {} jobs failed; {} submissions written to {}",
        report.failed().count(),
        report.jobs.len(),
        report.rerun.len(),
        args.output
    );
    Ok(())
}
