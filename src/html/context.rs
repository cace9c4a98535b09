use crate::html::writer::ActionWriter;
use crate::Options;

use std::io;
use std::io::Write;

/// The output of an HTML render, and what the renderer needs to know about
/// it.
pub struct Context<'o> {
    output: &'o mut dyn Write,
    last_was_lf: bool,

    /// The column of the next table cell in the current row.
    pub(crate) table_cell_index: usize,

    /// The options in effect.
    pub options: &'o Options,
}

impl<'o> Context<'o> {
    pub fn new(output: &'o mut dyn Write, options: &'o Options) -> Self {
        Context {
            output,
            last_was_lf: true,
            table_cell_index: 0,
            options,
        }
    }

    /// Starts a new line unless already at the start of one.
    pub fn cr(&mut self) -> io::Result<()> {
        if !self.last_was_lf {
            self.write_all(b"\n")?;
        }
        Ok(())
    }

    /// An [`ActionWriter`] over this output, preserving actions when the
    /// extension is on.
    pub fn writer(&mut self) -> ActionWriter<'_> {
        let preserve = self.options.extension.template_actions;
        ActionWriter::new(self).preserve_actions(preserve)
    }
}

impl<'o> Write for Context<'o> {
    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.output.write(buf)?;
        if n > 0 {
            self.last_was_lf = buf[n - 1] == b'\n';
        }
        Ok(n)
    }
}

impl<'o> std::fmt::Debug for Context<'o> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        formatter.write_str("<actionmark::html::Context>")
    }
}
