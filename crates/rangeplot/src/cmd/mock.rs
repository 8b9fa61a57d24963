use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rangeplot_frame::{FrameError, FrameWriter, MockFrameSource};
use rangeplot_transport::{SerialSource, DEFAULT_READ_TIMEOUT};
use tracing::info;

use crate::cmd::{install_ctrlc_handler, parse_byte, parse_interval, MockArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: MockArgs) -> CliResult<i32> {
    let interval = parse_interval(&args.interval)?;
    let terminator = parse_byte(&args.terminator)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut mock = MockFrameSource::with_terminator(terminator);

    let result = if args.stdout {
        let mut writer = FrameWriter::with_terminator(io::stdout().lock(), terminator);
        mock.write_frames(&mut writer, args.count, interval, &running)
    } else {
        let Some(port) = args.port.as_deref() else {
            return Err(CliError::new(USAGE, "either --port or --stdout is required"));
        };
        let link = SerialSource::open(port, args.baud, DEFAULT_READ_TIMEOUT)
            .map_err(|err| transport_error("open failed", err))?;
        let mut writer = FrameWriter::with_terminator(link, terminator);
        mock.write_frames(&mut writer, args.count, interval, &running)
    };

    match result {
        Ok(sent) => {
            info!(sent, "mock finished");
            Ok(SUCCESS)
        }
        // Reader went away (e.g. `| head -c`).
        Err(FrameError::Io(err)) if err.kind() == io::ErrorKind::BrokenPipe => Ok(SUCCESS),
        Err(err) => Err(frame_error("mock write failed", err)),
    }
}
