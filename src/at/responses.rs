// ABOUTME: Fixed-shape records for the information lines of SMS related AT commands
// ABOUTME: Each record is parsed once from a line; absent or malformed fields become None

use crate::at::Tokens;

/// `+CMGR: <stat>,[<alpha>],<length>`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CmgrHeader {
    pub status: Option<u8>,
    pub alpha: Option<String>,
    pub length: Option<usize>,
}

impl CmgrHeader {
    pub fn parse(line: &str) -> Self {
        let tokens = Tokens::new(line);
        Self {
            status: tokens.parse(0),
            alpha: tokens.get(1).filter(|a| !a.is_empty()).map(str::to_string),
            length: tokens.parse(2),
        }
    }
}

/// `+CMGL: <index>,<stat>,[<alpha>],<length>`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CmglEntry {
    pub index: Option<u32>,
    pub status: Option<u8>,
    pub length: Option<usize>,
}

impl CmglEntry {
    pub fn parse(line: &str) -> Self {
        let tokens = Tokens::new(line);
        Self {
            index: tokens.parse(0),
            status: tokens.parse(1),
            length: tokens.parse(3),
        }
    }
}

/// `+CPMS: <used1>,<total1>,...`; only the first storage pair matters here
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpmsCounts {
    pub used: Option<u32>,
    pub total: Option<u32>,
}

impl CpmsCounts {
    pub fn parse(line: &str) -> Self {
        let tokens = Tokens::new(line);
        Self {
            used: tokens.parse(0),
            total: tokens.parse(1),
        }
    }
}

/// `+CMGS: <mr>` and `+CMGW: <index>` both carry a single number
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NumericReply {
    pub value: Option<u32>,
}

impl NumericReply {
    pub fn parse(line: &str) -> Self {
        Self {
            value: Tokens::new(line).parse(0),
        }
    }
}

/// `+CSCA: "<sca>",<tosca>`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CscaReply {
    pub address: Option<String>,
    pub toa: Option<u8>,
}

impl CscaReply {
    pub fn parse(line: &str) -> Self {
        let tokens = Tokens::new(line);
        Self {
            address: tokens.get(0).map(str::to_string),
            toa: tokens.parse(1),
        }
    }
}

/// `+CSCB: <mode>,"<mids>","<dcss>"`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CscbReply {
    pub mode: Option<u8>,
    pub mids: Option<String>,
    pub dcss: Option<String>,
}

impl CscbReply {
    pub fn parse(line: &str) -> Self {
        let tokens = Tokens::new(line);
        Self {
            mode: tokens.parse(0),
            mids: tokens.get(1).map(str::to_string),
            dcss: tokens.get(2).map(str::to_string),
        }
    }
}

/// `+CRSM: <sw1>,<sw2>[,<response>]`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrsmReply {
    pub sw1: Option<u8>,
    pub sw2: Option<u8>,
    pub data: Option<String>,
}

impl CrsmReply {
    pub fn parse(line: &str) -> Self {
        let tokens = Tokens::new(line);
        Self {
            sw1: tokens.parse(0),
            sw2: tokens.parse(1),
            data: tokens.get(2).filter(|d| !d.is_empty()).map(str::to_string),
        }
    }

    /// `90 00`, normal ending of the command
    pub fn is_success(&self) -> bool {
        self.sw1 == Some(0x90) && self.sw2 == Some(0x00)
    }

    /// File access commands also accept `91 xx`, normal ending with a
    /// pending proactive command
    pub fn is_access_success(&self) -> bool {
        self.is_success() || (self.sw1 == Some(0x91) && self.sw2.is_some())
    }
}

/// `+CMTI: "<mem>",<index>` and the `+CDSI`/`+CBMI` equivalents
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageNotice {
    pub mem: Option<String>,
    pub index: Option<u32>,
}

impl StorageNotice {
    pub fn parse(line: &str) -> Self {
        let tokens = Tokens::new(line);
        Self {
            mem: tokens.get(0).map(str::to_string),
            index: tokens.parse(1),
        }
    }
}

/// Header of a two-line PDU notification: `+CMT: [<alpha>],<length>`, or
/// `+CDS: <length>` / `+CBM: <length>` where no alpha field exists
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PduNoticeHeader {
    pub alpha: Option<String>,
    pub length: Option<usize>,
}

impl PduNoticeHeader {
    pub fn parse(line: &str, with_alpha: bool) -> Self {
        let tokens = Tokens::new(line);
        if with_alpha {
            Self {
                alpha: tokens.get(0).filter(|a| !a.is_empty()).map(str::to_string),
                length: tokens.parse(1),
            }
        } else {
            Self {
                alpha: None,
                length: tokens.parse(0),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmgr_header() {
        let header = CmgrHeader::parse("+CMGR: 1,,24");
        assert_eq!(header.status, Some(1));
        assert_eq!(header.alpha, None);
        assert_eq!(header.length, Some(24));

        let header = CmgrHeader::parse("1,\"Bob\"");
        assert_eq!(header.alpha.as_deref(), Some("Bob"));
        assert_eq!(header.length, None);
    }

    #[test]
    fn test_cmgl_entry() {
        let entry = CmglEntry::parse("+CMGL: 4,1,,23");
        assert_eq!(entry.index, Some(4));
        assert_eq!(entry.status, Some(1));
        assert_eq!(entry.length, Some(23));
    }

    #[test]
    fn test_cpms_counts() {
        let counts = CpmsCounts::parse("+CPMS: 2,30,2,30,2,30");
        assert_eq!(counts.used, Some(2));
        assert_eq!(counts.total, Some(30));
        assert_eq!(CpmsCounts::parse("+CPMS: ").used, None);
    }

    #[test]
    fn test_csca_reply() {
        let reply = CscaReply::parse("+CSCA: \"447700900123\",145");
        assert_eq!(reply.address.as_deref(), Some("447700900123"));
        assert_eq!(reply.toa, Some(145));
    }

    #[test]
    fn test_crsm_status_words() {
        let reply = CrsmReply::parse("+CRSM: 144,0,\"0102\"");
        assert!(reply.is_success());
        assert_eq!(reply.data.as_deref(), Some("0102"));

        let reply = CrsmReply::parse("+CRSM: 145,12");
        assert!(!reply.is_success());
        assert!(reply.is_access_success());
        assert_eq!(reply.data, None);

        let reply = CrsmReply::parse("+CRSM: 106,130");
        assert!(!reply.is_access_success());
    }

    #[test]
    fn test_storage_notice() {
        let notice = StorageNotice::parse("+CMTI: \"SM\",3");
        assert_eq!(notice.mem.as_deref(), Some("SM"));
        assert_eq!(notice.index, Some(3));
    }

    #[test]
    fn test_pdu_notice_header() {
        let header = PduNoticeHeader::parse("+CMT: ,24", true);
        assert_eq!(header.length, Some(24));
        let header = PduNoticeHeader::parse("+CBM: 88", false);
        assert_eq!(header.length, Some(88));
    }
}
