use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("rangeplot {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: rangeplot");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", option_env!("RANGEPLOT_BUILD_TARGET").unwrap_or("unknown"));
    println!("profile: {}", option_env!("RANGEPLOT_BUILD_PROFILE").unwrap_or("unknown"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "wire: {} payload bytes + terminator 0x{:02X}",
        rangeplot_frame::PAYLOAD_LEN,
        rangeplot_frame::TERMINATOR
    );
    println!("fault_value: {}", rangeplot_frame::DEFAULT_FAULT_VALUE);

    Ok(SUCCESS)
}
