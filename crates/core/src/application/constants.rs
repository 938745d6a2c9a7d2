// Build action constants (ADR: No magic values)

// ----------------------------------------------------------------------------
// Test loop
// ----------------------------------------------------------------------------

/// Upper bound on test command runs
pub const DEFAULT_TEST_ITERATIONS: u32 = 100;

/// Log file printed after the loop, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "log.txt";

/// Native memory tracing switch read by the CRT; tests must run with leak detection on
pub const MEMORY_TRACING_VAR: &str = "AWS_CRT_MEMORY_TRACING";
pub const MEMORY_TRACING_LEVEL: &str = "2";

pub const DEFAULT_TEST_PROGRAM: &str = "mvn";
pub const DEFAULT_TEST_ARGS: &[&str] = &[
    "-B",
    "test",
    "-DredirectTestOutputToFile=true",
    "-DforkCount=0",
    "-DrerunFailingTestsCount=5",
    "-Daws.crt.memory.tracing=2",
    "-Daws.crt.debugnative=true",
    "-Daws.crt.aws_trace_log_per_test=true",
    "-DskipAfterFailureCount=1",
];

// ----------------------------------------------------------------------------
// SoftHSM2 / PKCS#11 setup
// ----------------------------------------------------------------------------

pub const SOFTHSM_PACKAGE: &str = "softhsm";
pub const SOFTHSM_LIBRARY_NAME: &str = "libsofthsm2.so";
pub const SOFTHSM_UTIL_PROGRAM: &str = "softhsm2-util";

/// Printed by softhsm2-util (2.1.0 and older) instead of failing on unknown flags
pub const SOFTHSM_USAGE_BANNER: &str = "Usage: softhsm2-util";

/// Machine-name prefix of hosts where PKCS#11 tests are disabled (Raspberry Pi)
pub const UNSUPPORTED_MACHINE_PREFIX: &str = "arm";

pub const DEFAULT_TOKEN_LABEL: &str = "my-test-token";
pub const DEFAULT_PIN: &str = "0000";
pub const DEFAULT_SO_PIN: &str = "0000";
pub const DEFAULT_KEY_LABEL: &str = "my-test-key";
/// Object ID of the imported key, hex encoded
pub const DEFAULT_KEY_ID: &str = "BEEFCAFE";

/// Test resources, relative to the source checkout
pub const DEFAULT_RESOURCES_DIR: &str = "crt/aws-c-io/tests/resources";
pub const PRIVATE_KEY_FILE: &str = "unittests.p8";
pub const CERT_FILE: &str = "unittests.crt";

// Exported variables
pub const SOFTHSM2_CONF_VAR: &str = "SOFTHSM2_CONF";
pub const TEST_PKCS11_LIB_VAR: &str = "TEST_PKCS11_LIB";
pub const TEST_PKCS11_TOKEN_LABEL_VAR: &str = "TEST_PKCS11_TOKEN_LABEL";
pub const TEST_PKCS11_PIN_VAR: &str = "TEST_PKCS11_PIN";
pub const TEST_PKCS11_PKEY_LABEL_VAR: &str = "TEST_PKCS11_PKEY_LABEL";
pub const TEST_PKCS11_CERT_FILE_VAR: &str = "TEST_PKCS11_CERT_FILE";
pub const TEST_PKCS11_CA_FILE_VAR: &str = "TEST_PKCS11_CA_FILE";
