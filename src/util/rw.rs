use std::{cell::RefCell, fmt::Write, io, rc::Rc};

pub struct StringBuffer {
    s: String,
}

impl StringBuffer {
    pub fn new() -> StringBuffer {
        StringBuffer { s: String::new() }
    }

    pub fn as_str(&self) -> &str {
        self.s.as_str()
    }

    pub fn export_string(&mut self) -> String {
        std::mem::take(&mut self.s)
    }
}

// String only implements fmt::Write
impl io::Write for StringBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let str_rep = std::str::from_utf8(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        match self.s.write_str(str_rep) {
            Ok(_) => Ok(buf.len()),
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct StrReader<'a> {
    s: &'a str,
    cursor: usize,
}

impl<'a> From<&'a str> for StrReader<'a> {
    fn from(value: &'a str) -> Self {
        StrReader { s: value, cursor: 0 }
    }
}

impl<'a> io::Read for StrReader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes = self.s.as_bytes();
        if self.cursor >= bytes.len() {
            return Ok(0);
        }
        let to_read = buf.len().min(bytes.len() - self.cursor);
        buf[..to_read].copy_from_slice(&bytes[self.cursor..self.cursor + to_read]);
        self.cursor += to_read;
        Ok(to_read)
    }
}

// For convenience, so we can pass around a shared stream writer.
//
// Lets the CLI entry points write to stdout/stderr in production and to
// capture buffers under test.
pub struct WriteHandle {
    w: Rc<RefCell<dyn io::Write>>,
}

impl WriteHandle {
    pub fn stdout_write_handle() -> WriteHandle {
        WriteHandle { w: Rc::new(RefCell::new(io::stdout())) }
    }

    pub fn stderr_write_handle() -> WriteHandle {
        WriteHandle { w: Rc::new(RefCell::new(io::stderr())) }
    }

    pub fn string_buff_write_handle() -> (WriteHandle, Rc<RefCell<StringBuffer>>) {
        let buffer = Rc::new(RefCell::new(StringBuffer::new()));
        let h = WriteHandle { w: buffer.clone() };
        (h, buffer)
    }

    pub fn empty_write_handle() -> WriteHandle {
        WriteHandle { w: Rc::new(RefCell::new(io::empty())) }
    }
}

impl io::Write for WriteHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.w.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.w.borrow_mut().flush()
    }
}
