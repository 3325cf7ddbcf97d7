//! ObjectId generation and representation.

use std::{
    error,
    fmt,
    result,
    sync::atomic::{AtomicUsize, Ordering},
    time::SystemTime,
};

use chrono::{DateTime, TimeZone, Utc};
use hex::FromHexError;
use lazy_static::lazy_static;
use rand::{thread_rng, Rng};

const TIMESTAMP_SIZE: usize = 4;
const MACHINE_SIZE: usize = 3;
const PROCESS_SIZE: usize = 2;
const COUNTER_SIZE: usize = 3;

const TIMESTAMP_OFFSET: usize = 0;
const MACHINE_OFFSET: usize = TIMESTAMP_OFFSET + TIMESTAMP_SIZE;
const PROCESS_OFFSET: usize = MACHINE_OFFSET + MACHINE_SIZE;
const COUNTER_OFFSET: usize = PROCESS_OFFSET + PROCESS_SIZE;

const MAX_U24: usize = 0xFF_FFFF;

lazy_static! {
    static ref PROCESS_GENERATOR: ObjectIdGenerator = ObjectIdGenerator::from_host();
}

/// Errors that can occur during ObjectId construction.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An invalid argument was passed in.
    ArgumentError { message: String },

    /// An error occurred parsing a hex string.
    FromHexError(FromHexError),
}

impl From<FromHexError> for Error {
    fn from(err: FromHexError) -> Error {
        Error::FromHexError(err)
    }
}

/// Alias for Result<T, oid::Error>.
pub type Result<T> = result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ArgumentError { message } => message.fmt(fmt),
            Error::FromHexError(inner) => inner.fmt(fmt),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::ArgumentError { .. } => None,
            Error::FromHexError(inner) => Some(inner),
        }
    }
}

/// A 12-byte MongoDB object identifier.
///
/// The layout is a 4-byte creation timestamp in seconds since the Unix
/// epoch, a 3-byte machine hash, a 2-byte process id and a 3-byte
/// incrementing counter. While BSON itself is little-endian, each of these
/// sub-fields is big-endian, most significant bytes first.
#[derive(Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct ObjectId {
    id: [u8; 12],
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectId {
    /// Generates a new ObjectId from the process-wide generator.
    pub fn new() -> ObjectId {
        PROCESS_GENERATOR.generate()
    }

    /// Constructs an ObjectId wrapper around the raw byte representation.
    pub fn with_bytes(bytes: [u8; 12]) -> ObjectId {
        ObjectId { id: bytes }
    }

    /// Creates an ObjectId from a 24-character hexadecimal string.
    pub fn with_string(s: &str) -> Result<ObjectId> {
        let bytes: Vec<u8> = hex::decode(s.as_bytes())?;
        if bytes.len() != 12 {
            Err(Error::ArgumentError {
                message: "provided string must be a 12-byte hexadecimal string".to_owned(),
            })
        } else {
            let mut byte_array: [u8; 12] = [0; 12];
            byte_array[..].copy_from_slice(&bytes[..]);
            Ok(ObjectId::with_bytes(byte_array))
        }
    }

    /// The creation time recorded in the leading four bytes.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let mut buf = [0; 4];
        buf.copy_from_slice(&self.id[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + TIMESTAMP_SIZE]);
        let seconds = u32::from_be_bytes(buf);

        // u32 seconds stay well inside chrono's representable range.
        Utc.timestamp_opt(i64::from(seconds), 0).unwrap()
    }

    /// The raw byte representation.
    pub fn bytes(&self) -> [u8; 12] {
        self.id
    }

    /// The 24-character hexadecimal representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.id)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

/// A source of ObjectIds.
///
/// The machine hash and process id are fixed at construction; the counter
/// is incremented atomically per generated id, so ids produced by
/// concurrent threads within the same second still differ in their last
/// three bytes. The codec itself holds no state: `ObjectId::new()` goes
/// through a lazily-created process-wide instance of this type.
pub struct ObjectIdGenerator {
    machine: [u8; MACHINE_SIZE],
    process: u16,
    counter: AtomicUsize,
}

impl ObjectIdGenerator {
    /// Creates a generator with the given machine hash, process id and
    /// initial counter value.
    pub fn new(machine: [u8; 3], process: u16, seed: u32) -> ObjectIdGenerator {
        ObjectIdGenerator {
            machine,
            process,
            counter: AtomicUsize::new(seed as usize),
        }
    }

    /// Creates a generator for this host and process: the machine field is
    /// the first three bytes of the MD5 digest of the hostname, and the
    /// counter starts at a random value.
    pub fn from_host() -> ObjectIdGenerator {
        let host = hostname::get()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "localhost".to_owned());
        let digest = md5::compute(host.as_bytes());

        let mut machine = [0; MACHINE_SIZE];
        machine.copy_from_slice(&digest.0[..MACHINE_SIZE]);

        let process = (std::process::id() & 0xFFFF) as u16;
        let seed = thread_rng().gen_range(0..=MAX_U24 as u32);

        ObjectIdGenerator::new(machine, process, seed)
    }

    /// Generates the next id.
    pub fn generate(&self) -> ObjectId {
        let timestamp = gen_timestamp();
        let counter = self.gen_count();

        let mut buf: [u8; 12] = [0; 12];
        buf[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + TIMESTAMP_SIZE].copy_from_slice(&timestamp);
        buf[MACHINE_OFFSET..MACHINE_OFFSET + MACHINE_SIZE].copy_from_slice(&self.machine);
        buf[PROCESS_OFFSET..PROCESS_OFFSET + PROCESS_SIZE]
            .copy_from_slice(&self.process.to_be_bytes());
        buf[COUNTER_OFFSET..COUNTER_OFFSET + COUNTER_SIZE].copy_from_slice(&counter);

        ObjectId::with_bytes(buf)
    }

    // The low 24 bits of the next counter value, big-endian.
    fn gen_count(&self) -> [u8; COUNTER_SIZE] {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);

        // Mod the loaded value rather than the atomic itself so concurrent
        // callers never observe the same count.
        let count = (count % (MAX_U24 + 1)) as u32;

        let bytes = count.to_be_bytes();
        [bytes[1], bytes[2], bytes[3]]
    }
}

// Current seconds since the epoch, big-endian.
fn gen_timestamp() -> [u8; TIMESTAMP_SIZE] {
    let seconds = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("system clock is before 1970")
        .as_secs() as u32;
    seconds.to_be_bytes()
}
