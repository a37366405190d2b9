use clap::Args;
use huskylens::{
    error::Result as LensResult, io_adapter::is_empty_read, Config, HuskyLens, IoAdapter,
};
use serialport::{ClearBuffer, SerialPort};
use simple_eyre::{eyre::eyre, Result};
use std::{
    io::{Read, Write},
    time::Duration,
};

#[derive(Args)]
pub struct SerialConf {
    /// Name of serial port that should be used
    #[arg(short, long)]
    pub serial: String,

    /// Baud rate the camera UART is configured for
    #[arg(short, long, default_value_t = 9600)]
    pub baud_rate: u32,

    /// How many 1 ms polls a read may take before the response counts as lost
    #[arg(long, default_value_t = 500)]
    pub read_polls: u32,
}

/// `IoAdapter` over a serial port, every poll waits at most one port timeout
pub struct SerialAdapter {
    port: Box<dyn SerialPort>,
}

impl IoAdapter for SerialAdapter {
    fn write_all(&mut self, buf: &[u8]) -> LensResult<()> {
        self.port.write_all(buf)?;
        self.port.flush()?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> LensResult<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if is_empty_read(e.kind()) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn available(&mut self) -> LensResult<usize> {
        let count = self.port.bytes_to_read().map_err(std::io::Error::from)?;
        Ok(count as usize)
    }

    fn flush_input(&mut self) -> LensResult<()> {
        self.port
            .clear(ClearBuffer::Input)
            .map_err(std::io::Error::from)?;
        Ok(())
    }
}

pub type SerialHuskyLens = HuskyLens<SerialAdapter>;

impl SerialConf {
    pub fn open_camera(&self) -> Result<SerialHuskyLens> {
        log::debug!("Opening {} at {} baud", self.serial, self.baud_rate);
        let port = serialport::new(&self.serial, self.baud_rate)
            .timeout(Duration::from_millis(1))
            .open()
            .map_err(|e| eyre!("Could not open serial port {}: {}", self.serial, e))?;
        let config = Config::default().with_read_polls(self.read_polls);
        Ok(HuskyLens::with_config(SerialAdapter { port }, config))
    }
}
