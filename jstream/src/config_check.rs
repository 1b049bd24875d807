// SPDX-License-Identifier: Apache-2.0

//! Exactly one integer width feature must be active; it fixes
//! [`ConfiguredInt`](crate::ConfiguredInt).

#[cfg(not(any(feature = "int32", feature = "int64")))]
compile_error!("jstream needs an integer width: enable feature 'int32' or 'int64'");

// int64 is a default feature, so int32 users must opt out of defaults
#[cfg(all(feature = "int32", feature = "int64"))]
compile_error!(
    "features 'int32' and 'int64' are mutually exclusive: build with --no-default-features --features int32"
);
