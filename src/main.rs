use anyhow::{anyhow, Context, Result};
use log::*;

use bufalloc::{Allocator, BUFFER_SIZE};

fn main() -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    // Only argument: how many buffers to allocate (one by
    // default).
    let count = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<usize>()
            .with_context(|| format!("Invalid buffer count '{arg}'."))?,
        None => 1,
    };

    // The diagnostics go to standard output and everything the
    // logger prints goes to standard error, so stdout ends up
    // with exactly one line per allocation.
    let allocator = Allocator::new();
    let mut buffers = Vec::with_capacity(count);
    for index in 0..count {
        let mut buffer = allocator.allocate()?;

        // Write the whole extent of the block to make sure it
        // really is as large as advertised.
        buffer.fill(index as u8);
        if buffer.len() != BUFFER_SIZE || buffer.iter().any(|&b| b != index as u8) {
            return Err(anyhow!("Buffer {index} does not hold {BUFFER_SIZE} bytes."));
        }
        buffers.push(buffer);
    }
    info!("Allocated {count} buffers of {BUFFER_SIZE} bytes.");

    for buffer in buffers {
        allocator.release(Some(buffer));
    }
    info!("Released {count} buffers.");

    Ok(())
}
