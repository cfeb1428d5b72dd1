use std::io::{self, Write};

pub fn write_line(writer: &mut dyn Write, content: &str) -> io::Result<()> {
    writer.write_all(content.as_bytes())?;
    writer.write_all(b"\n")
}
