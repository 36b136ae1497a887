// Serial port discovery and selection
//
// Order of preference: the configured port if it opens, then an interactive
// pick from the enumerated list, then the first enumerated port.

use serialport::{SerialPort, SerialPortType};
use std::io::{self, BufRead, IsTerminal, Write};
use std::num::IntErrorKind;
use std::time::Duration;

use crate::error::PortError;

/// Read timeout for open ports. Reads that time out are not errors.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// An enumerated serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device path or name (e.g. "/dev/ttyACM0", "COM3")
    pub name: String,
    /// Human-readable description, may be empty
    pub description: String,
}

/// Source of serial ports
pub trait PortProvider {
    /// List attached ports
    fn list(&self) -> Result<Vec<PortInfo>, PortError>;

    /// Open and immediately close a port to check it is usable
    fn try_open(&self, name: &str) -> Result<(), PortError>;
}

/// Ports from the operating system
#[derive(Debug, Clone)]
pub struct SystemPorts {
    baud_rate: u32,
}

impl SystemPorts {
    pub fn new(baud_rate: u32) -> Self {
        Self { baud_rate }
    }
}

impl PortProvider for SystemPorts {
    fn list(&self) -> Result<Vec<PortInfo>, PortError> {
        let ports =
            serialport::available_ports().map_err(|e| PortError::Enumerate(e.to_string()))?;

        Ok(ports
            .into_iter()
            .map(|p| PortInfo {
                description: describe(&p.port_type),
                name: p.port_name,
            })
            .collect())
    }

    fn try_open(&self, name: &str) -> Result<(), PortError> {
        open_port(name, self.baud_rate).map(drop)
    }
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.clone().unwrap_or_else(|| "USB serial".to_string());
            match &usb.manufacturer {
                Some(manufacturer) => format!("{} ({})", product, manufacturer),
                None => product,
            }
        }
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => String::new(),
    }
}

/// Open a port with 8N1 framing and the bridge read timeout
pub fn open_port(name: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>, PortError> {
    serialport::new(name, baud_rate)
        .timeout(READ_TIMEOUT)
        .data_bits(serialport::DataBits::Eight)
        .stop_bits(serialport::StopBits::One)
        .parity(serialport::Parity::None)
        .open()
        .map_err(|e| PortError::unavailable(name, e))
}

/// Parsed answer to the port prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortChoice {
    /// Zero-based index into the port list
    Index(usize),
    /// Operator asked to quit
    Abort,
}

/// Interpret the operator's answer for a list of `count` ports.
///
/// Blank and unparseable input pick the first port, `q` aborts, and numbers
/// outside `1..=count` are clamped into range.
pub fn parse_choice(input: &str, count: usize) -> PortChoice {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return PortChoice::Abort;
    }
    if input.is_empty() || count == 0 {
        return PortChoice::Index(0);
    }

    match input.parse::<i64>() {
        Ok(n) => {
            let clamped = n.clamp(1, count as i64);
            PortChoice::Index((clamped - 1) as usize)
        }
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => PortChoice::Index(count - 1),
        Err(e) if *e.kind() == IntErrorKind::NegOverflow => PortChoice::Index(0),
        Err(_) => {
            tracing::warn!(input = %input, "Invalid selection, using first port");
            PortChoice::Index(0)
        }
    }
}

/// Chooses which serial port the bridge opens
pub struct PortSelector<P> {
    provider: P,
}

impl<P: PortProvider> PortSelector<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Select a port, prompting on stdin when `interactive` and a terminal is attached.
    ///
    /// Returns `Ok(None)` when the operator quits.
    pub fn select_port(
        &self,
        preferred: Option<&str>,
        interactive: bool,
    ) -> Result<Option<String>, PortError> {
        let stdin = io::stdin();
        if interactive && stdin.is_terminal() {
            let mut input = stdin.lock();
            let mut output = io::stdout();
            self.select_with(preferred, Some((&mut input, &mut output)))
        } else {
            self.select_with::<io::Empty, io::Sink>(preferred, None)
        }
    }

    /// Select a port using the given terminal, or none for automatic selection
    pub fn select_with<R: BufRead, W: Write>(
        &self,
        preferred: Option<&str>,
        terminal: Option<(&mut R, &mut W)>,
    ) -> Result<Option<String>, PortError> {
        if let Some(name) = preferred {
            match self.provider.try_open(name) {
                Ok(()) => {
                    tracing::info!(port = %name, "Using configured port");
                    return Ok(Some(name.to_string()));
                }
                Err(e) => tracing::warn!(error = %e, "Configured port not available"),
            }
        }

        let ports = self.provider.list()?;
        if ports.is_empty() {
            return Err(PortError::NoPortsFound);
        }

        for (i, port) in ports.iter().enumerate() {
            tracing::info!(index = i + 1, port = %port.name, description = %port.description, "Available serial port");
        }

        let index = match terminal {
            Some((input, output)) => match prompt(&ports, input, output) {
                Ok(PortChoice::Abort) => return Ok(None),
                Ok(PortChoice::Index(i)) => i,
                Err(e) => {
                    tracing::warn!(error = %e, "Port prompt failed, using first port");
                    0
                }
            },
            None => {
                tracing::info!("Non-interactive: auto-selecting first available port");
                0
            }
        };

        Ok(Some(ports[index].name.clone()))
    }
}

fn prompt<R: BufRead, W: Write>(
    ports: &[PortInfo],
    input: &mut R,
    output: &mut W,
) -> io::Result<PortChoice> {
    writeln!(output, "Available serial ports:")?;
    for (i, port) in ports.iter().enumerate() {
        writeln!(output, " {}) {}  {}", i + 1, port.name, port.description)?;
    }
    write!(output, "Select port [1] or enter number (q to quit): ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no input"));
    }
    Ok(parse_choice(&line, ports.len()))
}
