//! Implementation of the `info` subcommand.

use crate::cli::{InfoArgs, ToolArgs};
use crate::error::CliResult;
use crate::output::{print_complex_params, print_properties};

use crftune_core::config::DEFAULT_MAX_CRF;
use crftune_core::external::{ComplexParams, FfprobeProber, Prober, check_dependency};
use crftune_core::processing::VideoProperties;

/// Executes `crftune info`: probes the input and shows the complex encode
/// settings derived from it.
pub fn run_info(tools: &ToolArgs, args: InfoArgs) -> CliResult<VideoProperties> {
    check_dependency(&tools.ffprobe)?;
    let prober = FfprobeProber::new(&tools.ffprobe, None);
    let props = prober.probe(&args.input)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&props)?);
    } else {
        print_properties(&props);
        let params = ComplexParams::from_properties(&props, &args.omit_options);
        print_complex_params(&params, DEFAULT_MAX_CRF);
    }
    Ok(props)
}
