//! Access to the LPC super-I/O status device (`/dev/lpc-sio`).
//!
//! The SIO driver exposes a handful of latched platform status bits through a
//! single ioctl. The daemon only consumes the power-fail latch, once, at
//! startup, to tell an AC-loss boot apart from a cold boot.

use std::os::fd::AsRawFd;

const LPC_SIO_PATH: &str = "/dev/lpc-sio";

/// Command codes understood by the SIO driver.
const SIO_GET_PFAIL_STATUS: u16 = 5;

#[repr(C)]
struct SioIoctlData {
    sio_cmd: u16,
    param: u16,
    data: u32,
}

const fn iowr(ty: u8, nr: u32, size: usize) -> libc::c_ulong {
    // _IOWR(): direction bits 3 (read | write), then size, type and number.
    ((3u32 << 30) | ((size as u32) << 16) | ((ty as u32) << 8) | nr) as libc::c_ulong
}

const SIO_IOC_COMMAND: libc::c_ulong = iowr(b'P', 1, std::mem::size_of::<SioIoctlData>());

/// Issues a SIO status command and returns the latched datum.
fn sio_status(cmd: u16) -> std::io::Result<u32> {
    let file = std::fs::File::options()
        .read(true)
        .write(true)
        .open(LPC_SIO_PATH)?;

    let mut req = SioIoctlData {
        sio_cmd: cmd,
        param: 0,
        data: 0,
    };
    let ret = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            SIO_IOC_COMMAND as _,
            &mut req as *mut SioIoctlData,
        )
    };
    if ret < 0 {
        return Err(std::io::Error::last_os_error());
    }

    Ok(req.data)
}

/// Returns whether the platform latched a power failure, i.e. whether this
/// boot follows a loss of mains power.
///
/// Any failure to open the device or to issue the command is reported as "no
/// AC loss signalled", which is the safe default on platforms without the
/// driver.
pub fn is_ac_boot() -> bool {
    match sio_status(SIO_GET_PFAIL_STATUS) {
        Ok(datum) => datum != 0,
        Err(err) => {
            tracing::warn!("cannot read SIO power-fail status: {}", err);
            false
        }
    }
}
