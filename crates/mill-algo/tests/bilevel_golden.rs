//! One leader, one follower, two identical clients

use mill_algo::bnb::{BnbConfig, BranchAndBound};
use mill_algo::{
    leader_revenue, BilevelCoordinator, CoordinatorConfig, ExactFollower, FollowerStrategy,
    GoodLpSolver, VndConfig,
};
use mill_core::Instance;

fn duopoly() -> Instance {
    Instance::new(vec![vec![0, 0]], vec![vec![0, 0]], vec![10, 10]).unwrap()
}

#[test]
fn test_bounds_follow_budgets() {
    let instance = duopoly();
    assert_eq!(instance.p_upper_bound(), &[10]);
    assert_eq!(instance.q_upper_bound(), &[10]);
}

#[test]
fn test_follower_undercuts_every_price_above_one() {
    let instance = duopoly();
    let solver = GoodLpSolver;
    let exact = ExactFollower::new(&instance, &solver);
    let config = BnbConfig::default();
    let bnb = BranchAndBound::new(&instance, &solver, &config);

    for p in 2..=10 {
        let response = exact.best_response(&[p]).unwrap();
        assert_eq!(response.prices.as_slice(), &[p - 1], "leader price {p}");
        assert_eq!(response.revenue, 2 * (p - 1));
        assert_eq!(leader_revenue(&instance, &[p], &response.prices), 0);

        let enumerated = bnb.solve(&[p], 7).unwrap();
        assert_eq!(enumerated.value(), Some(2 * (p - 1)), "leader price {p}");
    }
}

#[test]
fn test_follower_is_indifferent_at_price_one() {
    let instance = duopoly();
    let solver = GoodLpSolver;
    let exact = ExactFollower::new(&instance, &solver);

    assert_eq!(exact.best_response(&[1]).unwrap().revenue, 0);
    let cooperative = exact.cooperative_response(&[1]).unwrap();
    assert_eq!(cooperative.revenue, 0);
    assert_eq!(leader_revenue(&instance, &[1], &cooperative.prices), 2);
}

#[test]
fn test_cooperative_bilevel_optimum() {
    let instance = duopoly();
    let solver = GoodLpSolver;
    let config = CoordinatorConfig {
        strategy: FollowerStrategy::Cooperative,
        verify_exact: true,
        ..CoordinatorConfig::default()
    };
    let solution = BilevelCoordinator::new(&instance, &solver, &config)
        .solve()
        .unwrap();

    assert_eq!(solution.leader_prices.as_slice(), &[1]);
    assert_eq!(solution.leader_revenue, 2);
    assert_eq!(solution.reported_revenue(), 2);
    assert_eq!(solution.exact_check.unwrap().follower_gap, 0);
}

#[test]
fn test_same_seed_reproduces_vnd_run() {
    let instance = Instance::new(
        vec![vec![1, 3, 2], vec![4, 0, 2]],
        vec![vec![2, 2, 1], vec![0, 3, 4]],
        vec![9, 7, 8],
    )
    .unwrap();
    let solver = GoodLpSolver;
    let config = CoordinatorConfig {
        leader_vnd: VndConfig::light(),
        follower_vnd: VndConfig::light(),
        seed: 99,
        ..CoordinatorConfig::default()
    };

    let a = BilevelCoordinator::new(&instance, &solver, &config)
        .solve()
        .unwrap();
    let b = BilevelCoordinator::new(&instance, &solver, &config)
        .solve()
        .unwrap();
    assert_eq!(a.leader_prices, b.leader_prices);
    assert_eq!(a.follower_prices, b.follower_prices);
    assert_eq!(a.leader_revenue, b.leader_revenue);
    assert_eq!(
        a.leader_revenue,
        leader_revenue(&instance, &a.leader_prices, &a.follower_prices)
    );
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_leader_batches_match_sequential() {
    let instance = duopoly();
    let solver = GoodLpSolver;
    let sequential = CoordinatorConfig {
        strategy: FollowerStrategy::Exact,
        leader_vnd: VndConfig::light(),
        ..CoordinatorConfig::default()
    };
    let parallel = CoordinatorConfig {
        leader_vnd: VndConfig::light().with_parallel(true),
        ..sequential.clone()
    };

    let a = BilevelCoordinator::new(&instance, &solver, &sequential)
        .solve()
        .unwrap();
    let b = BilevelCoordinator::new(&instance, &solver, &parallel)
        .solve()
        .unwrap();
    assert_eq!(a.leader_prices, b.leader_prices);
    assert_eq!(a.leader_revenue, b.leader_revenue);
}
