//! Fixed-width user record: the payload stored in every leaf cell.
//!
//! A record is `(id: u32, username: string<=32, email: string<=255)`.
//! Strings are stored as null-padded byte arrays one byte longer than their
//! declared capacity (33 and 256 bytes), so the serialized width is exactly
//! `4 + 33 + 256 = 293` bytes. Serialization is pure and infallible: length
//! bounds are enforced earlier, when the command is parsed.

pub const USERNAME_CAP: usize = 32;
pub const EMAIL_CAP: usize = 255;

const ID_SIZE: usize = 4;
const USERNAME_SIZE: usize = USERNAME_CAP + 1;
const EMAIL_SIZE: usize = EMAIL_CAP + 1;

const ID_OFFSET: usize = 0;
const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Total serialized width of a record, in bytes.
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// A single user row: the value half of a leaf cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: u32,
    pub username: String,
    pub email: String,
}

impl Record {
    /// Builds a record after validating field lengths against the declared
    /// capacities. This is the only fallible step; `serialize` itself never
    /// fails.
    pub fn new(id: u32, username: &str, email: &str) -> Option<Self> {
        if username.len() > USERNAME_CAP || email.len() > EMAIL_CAP {
            return None;
        }
        Some(Record {
            id,
            username: username.to_string(),
            email: email.to_string(),
        })
    }

    /// Writes the record into a byte slice of length >= `ROW_SIZE`:
    /// `id` little-endian at offset 0, then the null-padded username and
    /// email byte arrays.
    pub fn serialize(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= ROW_SIZE);

        buf[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());

        let username_bytes = self.username.as_bytes();
        let username_slot = &mut buf[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE];
        username_slot.fill(0);
        username_slot[..username_bytes.len()].copy_from_slice(username_bytes);

        let email_bytes = self.email.as_bytes();
        let email_slot = &mut buf[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE];
        email_slot.fill(0);
        email_slot[..email_bytes.len()].copy_from_slice(email_bytes);
    }

    /// Reads a record back out of a byte slice of length >= `ROW_SIZE`,
    /// mirroring `serialize`.
    pub fn deserialize(buf: &[u8]) -> Self {
        debug_assert!(buf.len() >= ROW_SIZE);

        let mut id_bytes = [0u8; ID_SIZE];
        id_bytes.copy_from_slice(&buf[ID_OFFSET..ID_OFFSET + ID_SIZE]);
        let id = u32::from_le_bytes(id_bytes);

        let username = trim_nul(&buf[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]);
        let email = trim_nul(&buf[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]);

        Record { id, username, email }
    }
}

fn trim_nul(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_size_matches_layout() {
        assert_eq!(ROW_SIZE, 293);
    }

    #[test]
    fn round_trips_through_bytes() {
        let record = Record::new(7, "alice", "alice@example.com").unwrap();
        let mut buf = [0xFFu8; ROW_SIZE];
        record.serialize(&mut buf);
        let back = Record::deserialize(&buf);
        assert_eq!(record, back);
    }

    #[test]
    fn rejects_over_long_username() {
        let username: String = std::iter::repeat('a').take(USERNAME_CAP + 1).collect();
        assert!(Record::new(1, &username, "a@b.com").is_none());
    }

    #[test]
    fn rejects_over_long_email() {
        let email: String = std::iter::repeat('a').take(EMAIL_CAP + 1).collect();
        assert!(Record::new(1, "bob", &email).is_none());
    }

    #[test]
    fn accepts_maximum_length_fields() {
        let username: String = std::iter::repeat('a').take(USERNAME_CAP).collect();
        let email: String = std::iter::repeat('a').take(EMAIL_CAP).collect();
        assert!(Record::new(1, &username, &email).is_some());
    }
}
