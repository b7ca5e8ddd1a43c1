use rendezvous_lite::config::{ResolverConfig, VarNames};
use rendezvous_lite::resolver::{
    publish_rendezvous, resolve_address, resolve_identity, resolve_port,
    resolve_root_node_address, JobIdentity,
};
use rendezvous_lite::{JobContext, RendezvousError};

/// Context using the scheduler-neutral variable names
fn ctx(pairs: &[(&str, &str)]) -> JobContext {
    pairs.iter().copied().collect()
}

fn config() -> ResolverConfig {
    ResolverConfig::new(VarNames::unprefixed())
}

// =============================================================================
// Root node address
// =============================================================================

#[test]
fn test_root_node_plain_hostname() {
    assert_eq!(resolve_root_node_address("node01"), "node01");
}

#[test]
fn test_root_node_range() {
    assert_eq!(resolve_root_node_address("node[05-07]"), "node05");
}

#[test]
fn test_root_node_list() {
    assert_eq!(resolve_root_node_address("node[5,9,12]"), "node5");
}

#[test]
fn test_root_node_mixed_range_and_list() {
    assert_eq!(resolve_root_node_address("node[05-07,09]"), "node05");
}

// =============================================================================
// Address
// =============================================================================

#[test]
fn test_address_defaults_to_loopback() {
    assert_eq!(resolve_address(&ctx(&[]), &config()), "127.0.0.1");
}

#[test]
fn test_address_empty_node_list_defaults_to_loopback() {
    let c = ctx(&[("NODE_LIST", "  ")]);
    assert_eq!(resolve_address(&c, &config()), "127.0.0.1");
}

#[test]
fn test_address_takes_first_node() {
    let c = ctx(&[("NODE_LIST", "gpu[12-15],cpu01 login01")]);
    assert_eq!(resolve_address(&c, &config()), "gpu12");

    let c = ctx(&[("NODE_LIST", "alpha,beta")]);
    assert_eq!(resolve_address(&c, &config()), "alpha");
}

#[test]
fn test_address_is_deterministic() {
    let lists = [
        "node01",
        "node[05-07]",
        "node[5,9,12]",
        "node[05-07,09]",
        "a[1-2],b[3-4] c5",
    ];
    for list in lists {
        let c = ctx(&[("NODE_LIST", list)]);
        let first = resolve_address(&c, &config());
        let second = resolve_address(&c, &config());
        assert_eq!(first, second, "node list {list}");

        // Peers build their own context from the same scheduler output
        let peer = ctx(&[("NODE_LIST", list)]);
        assert_eq!(resolve_address(&peer, &config()), first);
    }
}

#[test]
fn test_address_reads_slurm_names_by_default() {
    let c = ctx(&[("SLURM_NODELIST", "node[05-07]"), ("NODE_LIST", "other01")]);
    assert_eq!(resolve_address(&c, &ResolverConfig::default()), "node05");
}

// =============================================================================
// Port
// =============================================================================

#[test]
fn test_port_explicit_override_wins() {
    let c = ctx(&[("MASTER_PORT", "6000"), ("JOB_ID", "123456789")]);
    assert_eq!(resolve_port(&c, &config()).unwrap(), 6000);

    let c = ctx(&[("MASTER_PORT", "6000")]);
    assert_eq!(resolve_port(&c, &config()).unwrap(), 6000);
}

#[test]
fn test_port_derived_from_job_id() {
    let c = ctx(&[("JOB_ID", "123456789")]);
    assert_eq!(resolve_port(&c, &config()).unwrap(), 21789);
}

#[test]
fn test_port_short_job_id_uses_whole_id() {
    let c = ctx(&[("JOB_ID", "7")]);
    assert_eq!(resolve_port(&c, &config()).unwrap(), 15007);
}

#[test]
fn test_port_default() {
    assert_eq!(resolve_port(&ctx(&[]), &config()).unwrap(), 12910);
}

#[test]
fn test_port_non_numeric_job_id_is_rejected() {
    let c = ctx(&[("JOB_ID", "12345_7a")]);
    let err = resolve_port(&c, &config()).unwrap_err();
    assert!(matches!(
        err,
        RendezvousError::MalformedPort { ref name, ref value } if name == "JOB_ID" && value == "12345_7a"
    ));
}

#[test]
fn test_port_malformed_override_is_rejected() {
    for bad in ["http", "70000", "-1"] {
        let c = ctx(&[("MASTER_PORT", bad)]);
        let err = resolve_port(&c, &config()).unwrap_err();
        assert!(
            matches!(err, RendezvousError::MalformedPort { ref name, .. } if name == "MASTER_PORT"),
            "override {bad}"
        );
    }
}

// =============================================================================
// Publishing
// =============================================================================

#[test]
fn test_publish_writes_derived_layer_only() {
    let mut c = ctx(&[("NODE_LIST", "node[05-07]"), ("JOB_ID", "123456789")]);
    let info = publish_rendezvous(&mut c, &config()).unwrap();

    assert_eq!(info.address, "node05");
    assert_eq!(info.port, 21789);
    assert_eq!(c.derived().get("MASTER_ADDR").map(String::as_str), Some("node05"));
    assert_eq!(c.derived().get("MASTER_PORT").map(String::as_str), Some("21789"));
    assert!(!c.is_exported("MASTER_PORT"));
    assert!(!c.is_exported("MASTER_ADDR"));
}

#[test]
fn test_publish_keeps_explicit_port_out_of_derived_layer() {
    let mut c = ctx(&[("MASTER_PORT", "6000")]);
    let info = publish_rendezvous(&mut c, &config()).unwrap();

    assert_eq!(info.port, 6000);
    assert!(c.derived().get("MASTER_PORT").is_none());
    assert_eq!(c.get_optional("MASTER_PORT"), Some("6000"));
}

#[test]
fn test_publish_is_stable_across_calls() {
    let mut c = ctx(&[("JOB_ID", "7")]);
    let first = publish_rendezvous(&mut c, &config()).unwrap();
    let second = publish_rendezvous(&mut c, &config()).unwrap();

    assert_eq!(first, second);
    assert_eq!(second.port, 15007);
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn test_identity_resolves_all_ranks() {
    let c = ctx(&[
        ("NTASKS", "4"),
        ("PROCID", "2"),
        ("LOCALID", "0"),
        ("NODEID", "1"),
    ]);
    let identity = resolve_identity(&c, &config()).unwrap();

    assert_eq!(
        identity,
        JobIdentity {
            global_rank: 2,
            local_rank: 0,
            node_rank: 1,
            world_size: 4,
        }
    );
    assert!(identity.global_rank < identity.world_size);
    assert!(!identity.is_root());
}

#[test]
fn test_identity_missing_world_size() {
    let c = ctx(&[("PROCID", "2"), ("LOCALID", "0"), ("NODEID", "1")]);
    let err = resolve_identity(&c, &config()).unwrap_err();
    assert!(matches!(err, RendezvousError::MissingVariable { ref name } if name == "NTASKS"));
}

#[test]
fn test_identity_non_numeric_rank() {
    let c = ctx(&[
        ("NTASKS", "4"),
        ("PROCID", "two"),
        ("LOCALID", "0"),
        ("NODEID", "1"),
    ]);
    let err = resolve_identity(&c, &config()).unwrap_err();
    assert!(matches!(
        err,
        RendezvousError::MalformedIdentity { ref name, ref value } if name == "PROCID" && value == "two"
    ));
}

#[test]
fn test_identity_rank_outside_world_size() {
    let c = ctx(&[
        ("NTASKS", "4"),
        ("PROCID", "4"),
        ("LOCALID", "0"),
        ("NODEID", "1"),
    ]);
    let err = resolve_identity(&c, &config()).unwrap_err();
    assert!(matches!(
        err,
        RendezvousError::InvalidIdentity {
            global_rank: 4,
            world_size: 4
        }
    ));
}
