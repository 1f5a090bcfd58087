use std::fs::File;
use std::io::{Read, Seek};

use regex::Regex;

use crate::simulator::Access;

pub fn get_reader(file: File) -> Result<impl Read + Seek, String> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        Ok(BufReader::new(file))
    }
    // Memory map the file for speed on unix systems
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        unsafe {
            let m = Mmap::map(&file).map_err(|e| format!("Couldn't memory map the file: {e}"))?;
            m.advise(Advice::Sequential)
                .map_err(|e| format!("Failed to provide access advice to the OS, {e}"))?;
            Ok(Cursor::new(m))
        }
    }
}

/// Parses a trace into a list of accesses.
///
/// One access per line: `R <hex-address>` for reads, `W <hex-address> [value]`
/// for writes with an optional decimal byte value. Blank lines and lines
/// starting with `#` are skipped. The core works on plain integers; this
/// text-to-integer translation is the only place string address forms exist
///
/// # Arguments
///
/// * `reader`: Any readable source of the trace text
///
/// returns: Result<Vec<Access>, String>
pub fn parse_trace<R: Read>(mut reader: R) -> Result<Vec<Access>, String> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| format!("Couldn't read the trace: {e}"))?;
    let pattern = Regex::new(r"^(?P<op>[RW])\s+(?:0x)?(?P<addr>[0-9a-fA-F]+)(?:\s+(?P<val>\d+))?$")
        .map_err(|e| format!("Invalid trace pattern: {e}"))?;
    let mut accesses = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens = pattern
            .captures(line)
            .ok_or_else(|| format!("Couldn't parse trace line {}: {line:?}", number + 1))?;
        let address = u64::from_str_radix(&tokens["addr"], 16)
            .map_err(|e| format!("Bad address on trace line {}: {e}", number + 1))?;
        let write = &tokens["op"] == "W";
        let value = match tokens.name("val") {
            Some(v) => Some(
                v.as_str()
                    .parse::<u8>()
                    .map_err(|e| format!("Bad write value on trace line {}: {e}", number + 1))?,
            ),
            None => None,
        };
        if !write && value.is_some() {
            return Err(format!("Read on trace line {} can't carry a value", number + 1));
        }
        accesses.push(Access { address, write, value });
    }
    Ok(accesses)
}
