use crate::utils::parse_number;
use anyhow::Result;

pub const DEFAULT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalOptions {
    pub threshold: f64,
    pub run_area: bool,
    pub run_object: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            run_area: true,
            run_object: true,
        }
    }
}

impl EvalOptions {
    pub fn new(args: &clap::ArgMatches) -> Result<Self> {
        let mut opts = Self::default();
        if let Some(threshold) = args.value_of("threshold") {
            opts.threshold = parse_number(threshold, "threshold")?;
        }
        if args.is_present("skip-area") {
            opts.run_area = false;
        }
        if args.is_present("skip-object") {
            opts.run_object = false;
        }

        Ok(opts)
    }
}
