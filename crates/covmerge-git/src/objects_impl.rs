//! gix-backed object reads.

use crate::error::GitError;
use crate::gix_repo::GixRepo;
use crate::types::GitOid;

fn from_gix_oid(oid: &gix::oid) -> GitOid {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(oid.as_bytes());
    GitOid::from_bytes(bytes)
}

fn to_gix_oid(oid: GitOid) -> gix::ObjectId {
    gix::ObjectId::from_bytes_or_panic(oid.as_bytes())
}

pub fn read_blob(repo: &GixRepo, oid: GitOid) -> Result<Vec<u8>, GitError> {
    let mut blob = repo
        .repo
        .find_blob(to_gix_oid(oid))
        .map_err(|e| GitError::NotFound {
            message: format!("blob {oid}: {e}"),
        })?;
    Ok(blob.take_data())
}

pub fn blob_at(repo: &GixRepo, revision: &str, path: &str) -> Result<GitOid, GitError> {
    if revision.is_empty() || path.is_empty() {
        return Err(GitError::NotFound {
            message: format!("empty revision or path in '{revision}:{path}'"),
        });
    }
    let path = path.trim_start_matches('/');
    let spec = format!("{revision}:{path}");
    let id = repo
        .repo
        .rev_parse_single(spec.as_str())
        .map_err(|e| GitError::NotFound {
            message: format!("{spec}: {e}"),
        })?;
    let oid = id.detach();
    let obj = repo
        .repo
        .find_object(oid)
        .map_err(|e| GitError::NotFound {
            message: format!("object {oid}: {e}"),
        })?;
    match obj.kind {
        gix::object::Kind::Blob => Ok(from_gix_oid(&oid)),
        other => Err(GitError::InvalidOid {
            value: oid.to_string(),
            reason: format!("{spec} is a {other}, not a blob"),
        }),
    }
}
