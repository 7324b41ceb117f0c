//! RRT* path planning over axis-aligned box obstacles
//!
//! Samples are drawn from a lane of width `lane_width` centred on the
//! start-goal segment. New nodes are steered at most `step_size` from their
//! nearest neighbour, attached to the cheapest collision-free parent in a
//! shrinking neighbourhood, and the neighbourhood is rewired through them
//! whenever that shortens a path.

use nalgebra::Vector2;
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::common::{BoundingBox, Planner, PlannerOutput, PlannerState, Point2D};

#[derive(Debug, Clone)]
pub struct Node {
    pub x: f64,
    pub y: f64,
    pub cost: f64,
    pub parent: Option<usize>,
}

impl Node {
    pub fn new(x: f64, y: f64) -> Self {
        Node {
            x,
            y,
            cost: 0.0,
            parent: None,
        }
    }

    pub fn to_point(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Sampling region: rectangle aligned with the start-goal direction
struct Lane {
    origin: Vector2<f64>,
    along: Vector2<f64>,
    across: Vector2<f64>,
    length: f64,
    half_width: f64,
}

impl Lane {
    fn new(start: Point2D, goal: Point2D, width: f64) -> Self {
        let delta = goal.to_vector() - start.to_vector();
        let length = delta.norm();
        let along = if length > f64::EPSILON {
            delta / length
        } else {
            Vector2::new(1.0, 0.0)
        };
        Lane {
            origin: start.to_vector(),
            along,
            across: Vector2::new(-along.y, along.x),
            length,
            half_width: width / 2.0,
        }
    }

    fn sample(&self, rng: &mut StdRng) -> Point2D {
        let t = rng.gen_range(-self.half_width..=self.length + self.half_width);
        let s = rng.gen_range(-self.half_width..=self.half_width);
        Point2D::from(self.origin + self.along * t + self.across * s)
    }
}

/// RRT* planner
pub struct RRTStar {
    rng: StdRng,
    /// Goal sampling rate (0-100)
    pub goal_sample_rate: u32,
    /// Scale of the rewiring neighbourhood radius
    pub connect_circle_dist: f64,
    /// Keep refining until `max_iterations` instead of returning the first path
    pub search_until_max_iter: bool,
    node_list: Vec<Node>,
}

impl RRTStar {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic planner for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        RRTStar {
            rng,
            goal_sample_rate: 20,
            connect_circle_dist: 50.0,
            search_until_max_iter: false,
            node_list: Vec::new(),
        }
    }

    /// Tree from the most recent call to `plan`
    pub fn get_tree(&self) -> &[Node] {
        &self.node_list
    }

    fn planning(&mut self, state: &PlannerState) -> Option<Vec<Point2D>> {
        let hp = &state.hyperparameters;
        let obstacles = state.obstacle_snapshot.boxes();
        let clearance = hp.obstacle_clearance;
        let expand_dis = hp.step_size;
        let goal_radius = hp.step_size.max(hp.end_dist_threshold);
        let (start, goal) = (state.start, state.goal);

        self.node_list = vec![Node::new(start.x, start.y)];

        if start.distance(&goal) <= goal_radius && is_free(obstacles, &start, &goal, clearance) {
            return Some(vec![start, goal]);
        }

        let lane = Lane::new(start, goal, hp.lane_width);

        for i in 0..hp.max_iterations {
            if i % 1000 == 0 {
                debug!(iteration = i, nodes = self.node_list.len(), "rrt* progress");
            }

            let rnd = if self.rng.gen_range(0..100) >= self.goal_sample_rate {
                lane.sample(&mut self.rng)
            } else {
                goal
            };
            let nearest_ind = self.get_nearest_node_index(&rnd);
            let mut new_node = self.steer(nearest_ind, &rnd, expand_dis);

            let nearest = self.node_list[nearest_ind].to_point();
            if !is_free(obstacles, &nearest, &new_node.to_point(), clearance) {
                continue;
            }

            let near_inds = self.find_near_nodes(&new_node, expand_dis);
            if let Some((parent, cost)) = self.choose_parent(&new_node, &near_inds, obstacles, clearance) {
                if cost < new_node.cost {
                    new_node.parent = Some(parent);
                    new_node.cost = cost;
                }
            }

            let new_index = self.node_list.len();
            self.node_list.push(new_node);
            self.rewire(new_index, &near_inds, obstacles, clearance);

            if !self.search_until_max_iter {
                if let Some(last_index) = self.search_best_goal_node(&goal, goal_radius, obstacles, clearance) {
                    return Some(self.generate_final_course(last_index, goal));
                }
            }
        }

        debug!(max_iterations = hp.max_iterations, "reached max iteration");
        self.search_best_goal_node(&goal, goal_radius, obstacles, clearance)
            .map(|last_index| self.generate_final_course(last_index, goal))
    }

    fn get_nearest_node_index(&self, rnd: &Point2D) -> usize {
        self.node_list
            .iter()
            .enumerate()
            .min_by_key(|(_, n)| OrderedFloat(n.to_point().distance(rnd)))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn steer(&self, from_ind: usize, to: &Point2D, expand_dis: f64) -> Node {
        let from = &self.node_list[from_ind];
        let (dist, theta) = calc_distance_and_angle(&from.to_point(), to);
        let extend_length = dist.min(expand_dis);

        let mut new_node = Node::new(
            from.x + extend_length * theta.cos(),
            from.y + extend_length * theta.sin(),
        );
        new_node.parent = Some(from_ind);
        new_node.cost = from.cost + extend_length;
        new_node
    }

    fn find_near_nodes(&self, new_node: &Node, expand_dis: f64) -> Vec<usize> {
        let nnode = (self.node_list.len() + 1) as f64;
        let r = (self.connect_circle_dist * (nnode.ln() / nnode).sqrt()).min(expand_dis);
        let p = new_node.to_point();

        self.node_list
            .iter()
            .enumerate()
            .filter(|(_, node)| node.to_point().distance(&p) <= r)
            .map(|(i, _)| i)
            .collect()
    }

    /// Cheapest collision-free parent among `near_inds`, with its cost
    fn choose_parent(
        &self,
        new_node: &Node,
        near_inds: &[usize],
        obstacles: &[BoundingBox],
        clearance: f64,
    ) -> Option<(usize, f64)> {
        let p = new_node.to_point();
        near_inds
            .iter()
            .filter_map(|&i| {
                let near = &self.node_list[i];
                let q = near.to_point();
                is_free(obstacles, &q, &p, clearance).then(|| (i, near.cost + q.distance(&p)))
            })
            .min_by_key(|&(_, cost)| OrderedFloat(cost))
    }

    fn rewire(&mut self, new_index: usize, near_inds: &[usize], obstacles: &[BoundingBox], clearance: f64) {
        let new_point = self.node_list[new_index].to_point();
        let new_cost = self.node_list[new_index].cost;

        for &i in near_inds {
            let near_point = self.node_list[i].to_point();
            let edge_cost = new_cost + new_point.distance(&near_point);
            if edge_cost < self.node_list[i].cost && is_free(obstacles, &new_point, &near_point, clearance) {
                self.node_list[i].parent = Some(new_index);
                self.node_list[i].cost = edge_cost;
                self.propagate_cost_to_leaves(i);
            }
        }
    }

    fn propagate_cost_to_leaves(&mut self, parent_ind: usize) {
        let mut stack = vec![parent_ind];
        while let Some(p) = stack.pop() {
            let parent_point = self.node_list[p].to_point();
            let parent_cost = self.node_list[p].cost;
            for i in 0..self.node_list.len() {
                if self.node_list[i].parent == Some(p) {
                    let d = parent_point.distance(&self.node_list[i].to_point());
                    self.node_list[i].cost = parent_cost + d;
                    stack.push(i);
                }
            }
        }
    }

    fn search_best_goal_node(
        &self,
        goal: &Point2D,
        goal_radius: f64,
        obstacles: &[BoundingBox],
        clearance: f64,
    ) -> Option<usize> {
        self.node_list
            .iter()
            .enumerate()
            .filter_map(|(i, node)| {
                let p = node.to_point();
                let d = p.distance(goal);
                (d <= goal_radius && is_free(obstacles, &p, goal, clearance)).then(|| (i, node.cost + d))
            })
            .min_by_key(|&(_, cost)| OrderedFloat(cost))
            .map(|(i, _)| i)
    }

    fn generate_final_course(&self, goal_ind: usize, goal: Point2D) -> Vec<Point2D> {
        let mut path = Vec::new();
        if self.node_list[goal_ind].to_point().distance(&goal) > f64::EPSILON {
            path.push(goal);
        }
        let mut node_index = Some(goal_ind);
        while let Some(index) = node_index {
            let node = &self.node_list[index];
            path.push(node.to_point());
            node_index = node.parent;
        }

        path.reverse();
        path
    }
}

impl Default for RRTStar {
    fn default() -> Self {
        Self::new()
    }
}

impl Planner for RRTStar {
    fn plan(&mut self, state: &PlannerState) -> PlannerOutput {
        match self.planning(state) {
            Some(path) if path.len() >= 2 => PlannerOutput::from_points(&path),
            _ => PlannerOutput::failure(state.start),
        }
    }
}

/// Segment `a -> b` keeps at least `clearance` from every box
fn is_free(obstacles: &[BoundingBox], a: &Point2D, b: &Point2D, clearance: f64) -> bool {
    obstacles.iter().all(|o| !o.intersects_segment(a, b, clearance))
}

fn calc_distance_and_angle(from: &Point2D, to: &Point2D) -> (f64, f64) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    (dx.hypot(dy), dy.atan2(dx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Hyperparameters;
    use crate::obstacles::ObstacleSnapshot;

    fn create_test_state(obstacles: Vec<[f64; 4]>) -> PlannerState {
        let boxes = obstacles
            .into_iter()
            .map(|o| BoundingBox::try_from(o).unwrap())
            .collect();
        PlannerState {
            start: Point2D::new(140.0, 60.0),
            goal: Point2D::new(180.0, 60.0),
            hyperparameters: Hyperparameters {
                max_iterations: 5000,
                ..Default::default()
            },
            obstacle_snapshot: ObstacleSnapshot::from_boxes(boxes),
        }
    }

    #[test]
    fn test_rrt_star_avoids_box() {
        let state = create_test_state(vec![[158.0, 58.0, 162.0, 62.0], [165.0, 60.0, 170.0, 65.0]]);
        let mut planner = RRTStar::with_seed(7);

        let output = planner.plan(&state);

        assert!(output.success);
        let path = output.waypoints();
        assert!(path.len() >= 2);
        assert_eq!(path[0], state.start);
        assert!(path.last().unwrap().distance(&state.goal) < 1e-9);

        let boxes = state.obstacle_snapshot.boxes();
        for w in path.windows(2) {
            assert!(is_free(boxes, &w[0], &w[1], 1.0));
            assert!(w[0].distance(&w[1]) <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_rrt_star_blocked_lane_fails() {
        let state = create_test_state(vec![[150.0, 40.0, 155.0, 80.0]]);
        let mut planner = RRTStar::with_seed(1);
        planner.search_until_max_iter = true;

        let output = planner.plan(&PlannerState {
            hyperparameters: Hyperparameters { max_iterations: 500, ..Default::default() },
            ..state
        });

        assert!(!output.success);
        assert_eq!(output.waypoints(), vec![Point2D::new(140.0, 60.0)]);
    }

    #[test]
    fn test_rrt_star_direct_connection_near_goal() {
        let mut state = create_test_state(vec![]);
        state.start = Point2D::new(179.5, 60.0);
        let output = RRTStar::with_seed(3).plan(&state);
        assert!(output.success);
        assert_eq!(output.waypoints(), vec![Point2D::new(179.5, 60.0), Point2D::new(180.0, 60.0)]);
    }

    #[test]
    fn test_lane_samples_stay_in_corridor() {
        let lane = Lane::new(Point2D::new(0.0, 0.0), Point2D::new(0.0, 10.0), 4.0);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let p = lane.sample(&mut rng);
            assert!(p.x >= -2.0 - 1e-9 && p.x <= 2.0 + 1e-9);
            assert!(p.y >= -2.0 - 1e-9 && p.y <= 12.0 + 1e-9);
        }
    }

    #[test]
    fn test_tree_costs_are_consistent() {
        let state = create_test_state(vec![[158.0, 58.0, 162.0, 62.0]]);
        let mut planner = RRTStar::with_seed(5);
        planner.search_until_max_iter = true;
        planner.plan(&PlannerState {
            hyperparameters: Hyperparameters { max_iterations: 300, ..Default::default() },
            ..state
        });

        for node in planner.get_tree() {
            if let Some(p) = node.parent {
                let parent = &planner.get_tree()[p];
                let expected = parent.cost + parent.to_point().distance(&node.to_point());
                assert!((node.cost - expected).abs() < 1e-6);
            }
        }
    }
}
