//! End-to-end coverage of `Signer::sign` against a synthetic PE32+ image,
//! exercising properties that hold without a network-backed timestamp
//! authority: the embedded blob decodes as CMS `SignedData`, re-signing
//! replaces rather than appends, and root trimming drops only the root.

use rasn_cms::SignedData;
use rasn_pkix::{
    AlgorithmIdentifier, Attribute, AttributeTypeAndValue, Certificate, Name, RdnSequence,
    RelativeDistinguishedName, SubjectPublicKeyInfo, TbsCertificate, Time, Validity, Version,
};
use rasn::types::{Any, BitString, Integer, ObjectIdentifier, SetOf};

use signet_core::cms::SigningKey;
use signet_core::signer::SignerBuilder;

/// Bytes for a minimal, well-formed-enough PE32+ image: DOS stub, COFF
/// header (x86_64, 0 sections), and an Optional Header with 16 data
/// directories, no existing certificate table.
fn synthetic_pe(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    bytes[0x3c..0x40].copy_from_slice(&0x40u32.to_le_bytes());
    bytes[0x40..0x44].copy_from_slice(b"PE\0\0");
    let coff = 0x44;
    bytes[coff..coff + 2].copy_from_slice(&0x8664u16.to_le_bytes());
    bytes[coff + 16..coff + 18].copy_from_slice(&240u16.to_le_bytes());
    let opt = coff + 20;
    bytes[opt..opt + 2].copy_from_slice(&0x20bu16.to_le_bytes());
    let number_of_rva_sizes_offset = opt + 24 + 84;
    bytes[number_of_rva_sizes_offset..number_of_rva_sizes_offset + 4]
        .copy_from_slice(&16u32.to_le_bytes());
    bytes
}

fn rdn_name(cn: &str) -> Name {
    let mut rdn = SetOf::new();
    rdn.insert(AttributeTypeAndValue {
        r#type: ObjectIdentifier::new(vec![2, 5, 4, 3]),
        value: Any::new(cn.as_bytes().to_vec()),
    });
    Name::RdnSequence(RdnSequence(vec![RelativeDistinguishedName(rdn)]))
}

fn self_signed_leaf() -> Certificate {
    let subject = rdn_name("integration-test-leaf");
    let tbs = TbsCertificate {
        version: Version(2),
        serial_number: Integer::from(42),
        signature: AlgorithmIdentifier {
            algorithm: ObjectIdentifier::new(vec![1, 2, 840, 113_549, 1, 1, 11]),
            parameters: None,
        },
        issuer: subject.clone(),
        validity: Validity {
            not_before: Time::Utc(Default::default()),
            not_after: Time::Utc(Default::default()),
        },
        subject,
        subject_public_key_info: SubjectPublicKeyInfo {
            algorithm: AlgorithmIdentifier {
                algorithm: ObjectIdentifier::new(vec![1, 2, 840, 113_549, 1, 1, 1]),
                parameters: None,
            },
            subject_public_key: BitString::from_vec(vec![0]),
        },
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: None,
    };
    Certificate {
        tbs_certificate: tbs,
        signature_algorithm: AlgorithmIdentifier {
            algorithm: ObjectIdentifier::new(vec![1, 2, 840, 113_549, 1, 1, 11]),
            parameters: None,
        },
        signature_value: BitString::from_vec(vec![0]),
    }
}

fn write_fixture(dir: &tempfile::TempDir, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join("fixture.exe");
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn signs_without_timestamping_and_produces_a_valid_cms_blob() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, &synthetic_pe(600));

    let key = SigningKey::Rsa(rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap());
    let chain = vec![self_signed_leaf()];

    let signer = SignerBuilder::new()
        .chain(chain)
        .private_key(key)
        .hash_algorithm("SHA-256")
        .timestamping(false)
        .build()
        .expect("valid configuration");

    signer.sign(&path).expect("signing succeeds");

    let signed_bytes = std::fs::read(&path).unwrap();
    assert_eq!(signed_bytes.len() % 8, 0, "file length must stay 8-byte aligned");
    assert!(signed_bytes.len() > 600, "certificate table was appended");

    // Locate and decode the Certificate Table entry from the directory
    // entry this crate itself wrote, rather than re-deriving offsets.
    let dir_entry_offset = 0x44 + 20 + 24 + 88 + 4 * 8; // matches synthetic_pe layout (coff + standard + windows fields + dir index 4)
    let rva = u32::from_le_bytes(signed_bytes[dir_entry_offset..dir_entry_offset + 4].try_into().unwrap());
    let size = u32::from_le_bytes(signed_bytes[dir_entry_offset + 4..dir_entry_offset + 8].try_into().unwrap());
    assert_eq!(size % 8, 0, "Certificate Table entry length must be a multiple of 8");

    let entry = &signed_bytes[rva as usize..(rva + size) as usize];
    let revision = u16::from_le_bytes(entry[4..6].try_into().unwrap());
    let cert_type = u16::from_le_bytes(entry[6..8].try_into().unwrap());
    assert_eq!(revision, 0x0200);
    assert_eq!(cert_type, 0x0002);

    let der = &entry[8..];
    let signed_data: SignedData = rasn::der::decode(der).expect("embedded blob decodes as CMS SignedData");
    assert_eq!(signed_data.signer_infos.to_vec().len(), 1);
    assert_eq!(signed_data.certificates.unwrap().to_vec().len(), 1);
}

#[test]
fn resigning_replaces_rather_than_appends_beside_the_prior_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, &synthetic_pe(600));

    let make_signer = || {
        SignerBuilder::new()
            .chain(vec![self_signed_leaf()])
            .private_key(SigningKey::Rsa(
                rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap(),
            ))
            .timestamping(false)
            .build()
            .unwrap()
    };

    make_signer().sign(&path).unwrap();
    let first_len = std::fs::metadata(&path).unwrap().len();

    make_signer().sign(&path).unwrap();
    let second_len = std::fs::metadata(&path).unwrap().len();

    // Both signatures are the same size class (same key size, same
    // chain, no timestamp token), so a second signing that *appended*
    // beside the first would double the file; replacing keeps it close
    // to the same size.
    assert!(
        second_len < first_len * 2,
        "re-signing should replace the prior certificate table, not append beside it"
    );
}

#[test]
fn chain_of_three_drops_only_the_self_signed_root() {
    let leaf = {
        let mut c = self_signed_leaf();
        c.tbs_certificate.subject = rdn_name("leaf");
        c.tbs_certificate.issuer = rdn_name("intermediate");
        c
    };
    let intermediate = {
        let mut c = self_signed_leaf();
        c.tbs_certificate.subject = rdn_name("intermediate");
        c.tbs_certificate.issuer = rdn_name("root");
        c
    };
    let root = {
        let mut c = self_signed_leaf();
        c.tbs_certificate.subject = rdn_name("root");
        c.tbs_certificate.issuer = rdn_name("root");
        c
    };

    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, &synthetic_pe(600));

    let signer = SignerBuilder::new()
        .chain(vec![leaf, intermediate, root])
        .private_key(SigningKey::Rsa(
            rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap(),
        ))
        .timestamping(false)
        .build()
        .unwrap();
    signer.sign(&path).unwrap();

    let signed_bytes = std::fs::read(&path).unwrap();
    let dir_entry_offset = 0x44 + 20 + 24 + 88 + 4 * 8;
    let rva = u32::from_le_bytes(signed_bytes[dir_entry_offset..dir_entry_offset + 4].try_into().unwrap());
    let size = u32::from_le_bytes(signed_bytes[dir_entry_offset + 4..dir_entry_offset + 8].try_into().unwrap());
    let der = &signed_bytes[(rva + 8) as usize..(rva + size) as usize];
    let signed_data: SignedData = rasn::der::decode(der).unwrap();
    assert_eq!(signed_data.certificates.unwrap().to_vec().len(), 2, "root excluded, leaf+intermediate embedded");
}
