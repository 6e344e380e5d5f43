use super::*;

#[test]
fn test_display_messages() {
    let cases = [
        (
            Error::OutOfFreeListSpace { requested: 64, available: 32 },
            "Out of free list space: requested 64 bytes, 32 bytes remaining",
        ),
        (
            Error::NodeAlreadyFreed { offset: 128 },
            "Block at offset 128 was already freed",
        ),
        (
            Error::InvalidFreeListBlock { offset: 10, size: 0 },
            "Invalid free list block (offset 10, size 0)",
        ),
        (Error::PoolFull, "Handle pool is full"),
        (Error::StaleOrInvalidHandle, "Stale or invalid handle"),
        (
            Error::BackendError("device lost".to_string()),
            "Backend error: device lost",
        ),
        (
            Error::InvalidResource("bad stride".to_string()),
            "Invalid resource: bad stride",
        ),
    ];
    for (error, expected) in cases {
        assert_eq!(error.to_string(), expected);
    }
}

#[test]
fn test_capacity_exhaustion_classification() {
    assert!(Error::OutOfFreeListSpace { requested: 1, available: 0 }.is_capacity_exhaustion());
    assert!(Error::ExceededMaxAllocations.is_capacity_exhaustion());
    assert!(Error::PoolFull.is_capacity_exhaustion());

    assert!(!Error::StaleOrInvalidHandle.is_capacity_exhaustion());
    assert!(!Error::NodeAlreadyFreed { offset: 0 }.is_capacity_exhaustion());
    assert!(!Error::CannotCopyToSmallerFreeList.is_capacity_exhaustion());
    assert!(!Error::BackendError("x".to_string()).is_capacity_exhaustion());
}

#[test]
fn test_error_is_std_error() {
    fn takes_std_error(_: &dyn std::error::Error) {}
    takes_std_error(&Error::PoolFull);
}

#[test]
fn test_engine_err_builds_invalid_resource() {
    let err = crate::engine_err!("nova3d::Test", "stride {} is invalid", 0);
    assert_eq!(err, Error::InvalidResource("stride 0 is invalid".to_string()));
}

#[test]
fn test_engine_bail_returns_early() {
    fn check(size: u64) -> Result<u64> {
        if size == 0 {
            crate::engine_bail!("nova3d::Test", "size must be non-zero");
        }
        Ok(size)
    }

    assert_eq!(check(8), Ok(8));
    assert_eq!(
        check(0),
        Err(Error::InvalidResource("size must be non-zero".to_string()))
    );
}
