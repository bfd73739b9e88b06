use mohtaref_blob::BlobError;
use mohtaref_core::errors::SiteError;

/// Map an object-store failure onto the HTTP error taxonomy.
///
/// `missing` is the message used when the object does not exist.
pub fn blob_error(err: BlobError, missing: &str) -> anyhow::Error {
    let site = match &err {
        BlobError::NotFound { .. } => SiteError::not_found(missing),
        BlobError::Invalid { message } => SiteError::bad_request(message.clone()),
        BlobError::Timeout { secs } => SiteError::timeout(format!("Upload timed out after {secs}s")),
        BlobError::Unavailable { message } => SiteError::unavailable(message.clone()),
        BlobError::Backend { .. } | BlobError::Io { .. } => {
            SiteError::general_error("Object store error")
        }
    };
    site.with_source(err.into()).into_anyhow()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mohtaref_core::ErrorKind;

    #[test]
    fn kinds_follow_the_taxonomy() {
        let cases = [
            (BlobError::not_found("x"), ErrorKind::NotFound),
            (BlobError::invalid("Invalid file type. Only images are allowed."), ErrorKind::BadRequest),
            (BlobError::Timeout { secs: 60 }, ErrorKind::Timeout),
            (BlobError::unavailable("down"), ErrorKind::Unavailable),
            (BlobError::from(std::io::Error::other("disk")), ErrorKind::GeneralError),
        ];
        for (err, kind) in cases {
            assert_eq!(SiteError::kind_of(&blob_error(err, "Image not found")), kind);
        }
    }

    #[test]
    fn invalid_keeps_the_bucket_message() {
        let err = blob_error(BlobError::invalid("Invalid file type. Only videos are allowed."), "");
        let site = SiteError::from_anyhow(&err).unwrap();
        assert_eq!(site.message, "Invalid file type. Only videos are allowed.");
    }
}
