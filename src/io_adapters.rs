use std::cell::RefCell;
use std::io::{Result as IoResult, Write};
use std::process::Stdio;
use std::rc::Rc;

/// Memory-backed writer for capturing the shell's standard output.
///
/// External commands writing to it get a pipe whose contents are copied in.
#[derive(Default)]
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared buffer holding everything written so far.
    pub fn into_inner(self) -> Rc<RefCell<Vec<u8>>> {
        self.buf
    }

    /// A writer plus a handle that stays readable after the writer is boxed away.
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let writer = MemWriter::new();
        let handle = Rc::clone(&writer.buf);
        (writer, handle)
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl crate::command::Stdout for MemWriter {
    fn stdio(&self) -> Option<Stdio> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_sees_writes() {
        let (mut writer, handle) = MemWriter::with_handle();
        write!(writer, "a{}", 1).unwrap();
        writer.write_all(b"b").unwrap();
        assert_eq!(handle.borrow().as_slice(), b"a1b");
        assert_eq!(writer.into_inner().borrow().len(), 3);
    }
}
