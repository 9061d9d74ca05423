//! Content codes and the code → type registry

use std::collections::HashMap;
use std::fmt;

/// A 4-character ASCII content code identifying a DMAP field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentCode(pub [u8; 4]);

impl ContentCode {
    /// Create a code from a 4-byte literal
    #[must_use]
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }
}

impl fmt::Display for ContentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = std::str::from_utf8(&self.0).unwrap_or("????");
        write!(f, "{s}")
    }
}

impl From<&[u8; 4]> for ContentCode {
    fn from(code: &[u8; 4]) -> Self {
        Self(*code)
    }
}

/// Wire type of a content code's payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// Unsigned 8-bit integer
    U8,
    /// Signed 8-bit integer
    I8,
    /// Unsigned 16-bit integer, big-endian
    U16,
    /// Signed 16-bit integer, big-endian
    I16,
    /// Unsigned 32-bit integer, big-endian
    U32,
    /// Signed 32-bit integer, big-endian
    I32,
    /// Unsigned 64-bit integer, big-endian
    U64,
    /// Signed 64-bit integer, big-endian
    I64,
    /// UTF-8 string, exactly `length` bytes, no NUL terminator
    Str,
    /// Seconds since the epoch as unsigned 32-bit
    Date,
    /// Protocol version: u16 major, u8 minor, u8 micro
    Version,
    /// Nested sequence of chunks
    Container,
    /// Uninterpreted bytes (also the fallback for unknown codes)
    Raw,
}

/// Open registry mapping content codes to their wire types.
///
/// The well-known DAAP/DMAP codes are hard-wired in [`Default`]; servers can
/// define additional codes, which callers register at run time. Codes absent
/// from the registry decode as [`ContentType::Raw`].
#[derive(Debug, Clone)]
pub struct ContentCodeRegistry {
    types: HashMap<ContentCode, ContentType>,
}

impl ContentCodeRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Register or override a code's type
    pub fn register(&mut self, code: ContentCode, ty: ContentType) {
        self.types.insert(code, ty);
    }

    /// Look up a code, falling back to [`ContentType::Raw`]
    #[must_use]
    pub fn lookup(&self, code: ContentCode) -> ContentType {
        self.types.get(&code).copied().unwrap_or(ContentType::Raw)
    }
}

impl Default for ContentCodeRegistry {
    #[allow(clippy::too_many_lines)]
    fn default() -> Self {
        use ContentType::{Container, Date, Str, Version, U8, U16, U32, U64};

        let mut registry = Self::empty();
        let mut put = |code: &[u8; 4], ty| registry.register(ContentCode::new(code), ty);

        // dmap generics
        put(b"mstt", U32); // status
        put(b"msts", Str); // status string
        put(b"miid", U32); // item id
        put(b"minm", Str); // item name
        put(b"mikd", U8); // item kind
        put(b"mper", U64); // persistent id
        put(b"mcti", U32); // container item id
        put(b"mpco", U32); // parent container id
        put(b"mimc", U32); // item count
        put(b"mrco", U32); // returned count
        put(b"mtco", U32); // total count
        put(b"muty", U8); // update type
        put(b"mlcl", Container); // listing
        put(b"mlit", Container); // listing item
        put(b"mbcl", Container); // bag
        put(b"mdcl", Container); // dictionary

        // server info / session
        put(b"msrv", Container); // server info response
        put(b"mpro", Version); // dmap protocol version
        put(b"apro", Version); // daap protocol version
        put(b"msau", U8); // authentication method
        put(b"mslr", U8); // login required
        put(b"mstm", U32); // timeout interval
        put(b"msdc", U32); // database count
        put(b"msal", U8); // auto-logout
        put(b"msup", U8); // supports update
        put(b"mspi", U8); // supports persistent ids
        put(b"msex", U8); // supports extensions
        put(b"msbr", U8); // supports browse
        put(b"msqy", U8); // supports query
        put(b"msix", U8); // supports index
        put(b"msrs", U8); // supports resolve
        put(b"mlog", Container); // login response
        put(b"mlid", U32); // session id
        put(b"mupd", Container); // update response
        put(b"musr", U32); // server revision

        // content-codes listing
        put(b"mccr", Container);
        put(b"mcnm", U32); // code number
        put(b"mcna", Str); // code name
        put(b"mcty", U16); // code type

        // databases and playlists
        put(b"avdb", Container); // server databases
        put(b"adbs", Container); // database songs
        put(b"aply", Container); // database playlists
        put(b"abpl", U8); // base playlist flag
        put(b"apso", Container); // playlist songs

        // song metadata
        put(b"asal", Str); // album
        put(b"asar", Str); // artist
        put(b"asbr", U16); // bitrate
        put(b"ascm", Str); // comment
        put(b"asco", U8); // compilation
        put(b"asda", Date); // date added
        put(b"asdm", Date); // date modified
        put(b"asdc", U16); // disc count
        put(b"asdn", U16); // disc number
        put(b"asdb", U8); // disabled
        put(b"asdk", U8); // data kind
        put(b"asfm", Str); // format
        put(b"asgn", Str); // genre
        put(b"asdt", Str); // description
        put(b"assr", U32); // sample rate
        put(b"assz", U32); // size
        put(b"asst", U32); // start time
        put(b"assp", U32); // stop time
        put(b"astm", U32); // time (duration ms)
        put(b"astc", U16); // track count
        put(b"astn", U16); // track number
        put(b"asur", U8); // user rating
        put(b"asyr", U16); // year
        put(b"asul", Str); // data url

        registry
    }
}
