//! Force-directed layout for the book network.
//!
//! A small velocity-based simulation in the style of d3-force: link springs
//! pull connected pages toward a rest distance, every pair of pages repels,
//! page boxes are kept apart by circular collision, and the whole graph is
//! re-centred on the canvas every tick. Activity is governed by `alpha`,
//! which decays toward `alpha_target` and stops the simulation once it drops
//! below `alpha_min`.

use std::collections::HashMap;
use std::f64::consts::PI;

use super::types::{PageLink, PageNode};

#[derive(Clone, Debug)]
pub struct LayoutParams {
	pub link_distance: f64,
	/// Negative values repel.
	pub charge_strength: f64,
	pub collide_radius: f64,
	pub collide_iterations: usize,
	pub collide_strength: f64,
	pub alpha_min: f64,
	pub alpha_decay: f64,
	pub velocity_decay: f64,
	/// Activity held while a node is being dragged.
	pub drag_alpha_target: f64,
}

impl Default for LayoutParams {
	fn default() -> Self {
		let alpha_min = 0.001;
		Self {
			link_distance: 220.0,
			charge_strength: -50.0,
			collide_radius: 100.0,
			collide_iterations: 4,
			collide_strength: 1.0,
			alpha_min,
			alpha_decay: 1.0 - f64::powf(alpha_min, 1.0 / 300.0),
			velocity_decay: 0.4,
			drag_alpha_target: 0.3,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
	pub id: String,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub fx: Option<f64>,
	pub fy: Option<f64>,
}

#[derive(Clone, Debug)]
struct SimLink {
	source: usize,
	target: usize,
	strength: f64,
	bias: f64,
}

type TickListener = Box<dyn FnMut(&[SimNode])>;

/// Deterministic jitter source for coincident nodes.
#[derive(Clone, Debug)]
struct Lcg(u64);

impl Lcg {
	fn next(&mut self) -> f64 {
		self.0 = (1_664_525 * self.0 + 1_013_904_223) % 4_294_967_296;
		self.0 as f64 / 4_294_967_296.0
	}

	fn jiggle(&mut self) -> f64 {
		(self.next() - 0.5) * 1e-6
	}
}

pub struct Simulation {
	nodes: Vec<SimNode>,
	links: Vec<SimLink>,
	index: HashMap<String, usize>,
	center: (f64, f64),
	params: LayoutParams,
	alpha: f64,
	alpha_target: f64,
	running: bool,
	listeners: Vec<TickListener>,
	rng: Lcg,
}

impl Simulation {
	/// Seeds a simulation centred on the canvas. Links whose endpoints are
	/// missing, or that loop back to their own source, are dropped.
	pub fn new(
		nodes: &[PageNode],
		links: &[PageLink],
		width: f64,
		height: f64,
		params: LayoutParams,
	) -> Self {
		let center = (width / 2.0, height / 2.0);
		let initial_angle = PI * (3.0 - 5f64.sqrt());

		let mut index = HashMap::with_capacity(nodes.len());
		let sim_nodes: Vec<SimNode> = nodes
			.iter()
			.enumerate()
			.map(|(i, node)| {
				index.insert(node.id.clone(), i);
				let radius = 10.0 * (0.5 + i as f64).sqrt();
				let angle = i as f64 * initial_angle;
				SimNode {
					id: node.id.clone(),
					x: center.0 + radius * angle.cos(),
					y: center.1 + radius * angle.sin(),
					vx: 0.0,
					vy: 0.0,
					fx: None,
					fy: None,
				}
			})
			.collect();

		let mut pairs = Vec::with_capacity(links.len());
		for link in links {
			match (index.get(&link.source), index.get(&link.target)) {
				(Some(&s), Some(&t)) if s != t => pairs.push((s, t)),
				_ => log::debug!(
					"dropping link {} -> {} from layout",
					link.source,
					link.target
				),
			}
		}

		let mut degree = vec![0usize; sim_nodes.len()];
		for &(s, t) in &pairs {
			degree[s] += 1;
			degree[t] += 1;
		}
		let sim_links = pairs
			.into_iter()
			.map(|(source, target)| SimLink {
				source,
				target,
				strength: 1.0 / degree[source].min(degree[target]) as f64,
				bias: degree[source] as f64 / (degree[source] + degree[target]) as f64,
			})
			.collect();

		Self {
			nodes: sim_nodes,
			links: sim_links,
			index,
			center,
			params,
			alpha: 1.0,
			alpha_target: 0.0,
			running: true,
			listeners: Vec::new(),
			rng: Lcg(1),
		}
	}

	#[cfg(test)]
	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	pub fn node(&self, idx: usize) -> Option<&SimNode> {
		self.nodes.get(idx)
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn position(&self, id: &str) -> Option<(f64, f64)> {
		self.index_of(id).map(|i| (self.nodes[i].x, self.nodes[i].y))
	}

	#[cfg(test)]
	pub fn link_count(&self) -> usize {
		self.links.len()
	}

	#[cfg(test)]
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	#[cfg(test)]
	pub fn is_running(&self) -> bool {
		self.running
	}

	pub fn params(&self) -> &LayoutParams {
		&self.params
	}

	/// Registers a callback fired after every tick with the latest positions.
	pub fn on_tick(&mut self, listener: impl FnMut(&[SimNode]) + 'static) {
		self.listeners.push(Box::new(listener));
	}

	/// Holds a node at `(x, y)`; links attached to it still pull on its neighbours.
	pub fn pin(&mut self, idx: usize, x: f64, y: f64) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.fx = Some(x);
			node.fy = Some(y);
			node.x = x;
			node.y = y;
		}
	}

	pub fn unpin(&mut self, idx: usize) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.fx = None;
			node.fy = None;
		}
	}

	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	/// Raises the activity floor to `energy` and resumes ticking.
	pub fn reheat(&mut self, energy: f64) {
		self.alpha_target = energy;
		self.restart();
	}

	pub fn restart(&mut self) {
		self.running = true;
	}

	pub fn stop(&mut self) {
		self.running = false;
	}

	/// Advances one frame when running. Returns whether a tick happened.
	pub fn step(&mut self) -> bool {
		if !self.running {
			return false;
		}
		self.tick();
		for listener in self.listeners.iter_mut() {
			listener(&self.nodes);
		}
		if self.alpha < self.params.alpha_min {
			self.running = false;
		}
		true
	}

	/// One integration step, independent of the running flag.
	pub fn tick(&mut self) {
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
		if self.nodes.is_empty() {
			return;
		}

		self.apply_links();
		self.apply_collision();
		self.apply_charge();
		self.apply_center();

		let keep = 1.0 - self.params.velocity_decay;
		for node in self.nodes.iter_mut() {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= keep;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= keep;
					node.y += node.vy;
				}
			}
		}
	}

	fn apply_links(&mut self) {
		for link in &self.links {
			let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = self.rng.jiggle();
			}
			if y == 0.0 {
				y = self.rng.jiggle();
			}
			let mut l = (x * x + y * y).sqrt();
			l = (l - self.params.link_distance) / l * self.alpha * link.strength;
			x *= l;
			y *= l;

			let b = link.bias;
			let target = &mut self.nodes[link.target];
			target.vx -= x * b;
			target.vy -= y * b;
			let source = &mut self.nodes[link.source];
			source.vx += x * (1.0 - b);
			source.vy += y * (1.0 - b);
		}
	}

	fn apply_collision(&mut self) {
		let r = self.params.collide_radius;
		let reach = r + r;
		let strength = self.params.collide_strength;
		let n = self.nodes.len();

		for _ in 0..self.params.collide_iterations {
			for i in 0..n {
				let xi = self.nodes[i].x + self.nodes[i].vx;
				let yi = self.nodes[i].y + self.nodes[i].vy;
				for j in (i + 1)..n {
					let other = &self.nodes[j];
					let mut x = xi - other.x - other.vx;
					let mut y = yi - other.y - other.vy;
					let mut l = x * x + y * y;
					if l >= reach * reach {
						continue;
					}
					if x == 0.0 {
						x = self.rng.jiggle();
						l += x * x;
					}
					if y == 0.0 {
						y = self.rng.jiggle();
						l += y * y;
					}
					let dist = l.sqrt();
					let push = (reach - dist) / dist * strength;
					x *= push;
					y *= push;
					// Equal radii split the correction evenly.
					let w = (r * r) / (r * r + r * r);
					self.nodes[i].vx += x * w;
					self.nodes[i].vy += y * w;
					self.nodes[j].vx -= x * (1.0 - w);
					self.nodes[j].vy -= y * (1.0 - w);
				}
			}
		}
	}

	fn apply_charge(&mut self) {
		let weight = self.params.charge_strength * self.alpha;
		let n = self.nodes.len();
		let mut deltas = vec![(0.0, 0.0); n];

		for (i, delta) in deltas.iter_mut().enumerate() {
			for j in 0..n {
				if i == j {
					continue;
				}
				let mut x = self.nodes[j].x - self.nodes[i].x;
				let mut y = self.nodes[j].y - self.nodes[i].y;
				let mut l = x * x + y * y;
				if x == 0.0 {
					x = self.rng.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = self.rng.jiggle();
					l += y * y;
				}
				if l < 1.0 {
					l = l.sqrt();
				}
				delta.0 += x * weight / l;
				delta.1 += y * weight / l;
			}
		}

		for (node, (dx, dy)) in self.nodes.iter_mut().zip(deltas) {
			node.vx += dx;
			node.vy += dy;
		}
	}

	fn apply_center(&mut self) {
		let n = self.nodes.len() as f64;
		let (sx, sy) = self
			.nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let (dx, dy) = (sx / n - self.center.0, sy / n - self.center.1);
		for node in self.nodes.iter_mut() {
			node.x -= dx;
			node.y -= dy;
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use chrono::Utc;

	use super::*;

	fn page(id: &str) -> PageNode {
		PageNode {
			id: id.into(),
			name: id.into(),
			short_desc: String::new(),
			updated_on: Utc::now(),
			ref_url: None,
			cover: None,
		}
	}

	fn distance(sim: &Simulation, a: &str, b: &str) -> f64 {
		let (ax, ay) = sim.position(a).unwrap();
		let (bx, by) = sim.position(b).unwrap();
		((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
	}

	fn settle(sim: &mut Simulation) -> usize {
		let mut ticks = 0;
		while sim.step() {
			ticks += 1;
			assert!(ticks < 1000, "simulation never came to rest");
		}
		ticks
	}

	#[test]
	fn empty_graph_is_valid() {
		let mut sim = Simulation::new(&[], &[], 800.0, 600.0, LayoutParams::default());
		assert!(sim.nodes().is_empty());
		assert!(sim.step());
		settle(&mut sim);
	}

	#[test]
	fn links_to_missing_nodes_are_dropped() {
		let nodes = [page("a"), page("b")];
		let links = [
			PageLink::new("a", "b"),
			PageLink::new("a", "ghost"),
			PageLink::new("b", "b"),
		];
		let mut sim = Simulation::new(&nodes, &links, 800.0, 600.0, LayoutParams::default());
		assert_eq!(sim.link_count(), 1);
		settle(&mut sim);
		assert!(sim.nodes().iter().all(|n| n.x.is_finite() && n.y.is_finite()));
	}

	#[test]
	fn linked_pair_settles_near_link_distance() {
		let nodes = [page("a"), page("b")];
		let links = [PageLink::new("a", "b")];
		let mut sim = Simulation::new(&nodes, &links, 800.0, 600.0, LayoutParams::default());
		settle(&mut sim);
		let d = distance(&sim, "a", "b");
		assert!((195.0..=260.0).contains(&d), "distance {d}");
	}

	#[test]
	fn unlinked_nodes_do_not_overlap() {
		let nodes: Vec<_> = ["a", "b", "c", "d"].into_iter().map(page).collect();
		let mut sim = Simulation::new(&nodes, &[], 800.0, 600.0, LayoutParams::default());
		settle(&mut sim);
		for a in ["a", "b", "c", "d"] {
			for b in ["a", "b", "c", "d"] {
				if a != b {
					assert!(distance(&sim, a, b) > 150.0, "{a}/{b} overlap");
				}
			}
		}
	}

	#[test]
	fn graph_is_centred_on_canvas() {
		let nodes: Vec<_> = ["a", "b", "c"].into_iter().map(page).collect();
		let links = [PageLink::new("a", "b")];
		let mut sim = Simulation::new(&nodes, &links, 1000.0, 400.0, LayoutParams::default());
		settle(&mut sim);
		let n = sim.nodes().len() as f64;
		let cx = sim.nodes().iter().map(|n| n.x).sum::<f64>() / n;
		let cy = sim.nodes().iter().map(|n| n.y).sum::<f64>() / n;
		assert!((cx - 500.0).abs() < 1.0);
		assert!((cy - 200.0).abs() < 1.0);
	}

	#[test]
	fn alpha_decays_to_rest() {
		let nodes = [page("a")];
		let mut sim = Simulation::new(&nodes, &[], 800.0, 600.0, LayoutParams::default());
		let ticks = settle(&mut sim);
		assert!((290..=310).contains(&ticks), "{ticks} ticks");
		assert!(!sim.is_running());
		assert!(!sim.step());
	}

	#[test]
	fn tick_listeners_fire_until_stopped() {
		let nodes = [page("a"), page("b")];
		let mut sim = Simulation::new(&nodes, &[], 800.0, 600.0, LayoutParams::default());
		let count = Rc::new(Cell::new(0));
		let seen = count.clone();
		sim.on_tick(move |nodes| {
			assert_eq!(nodes.len(), 2);
			seen.set(seen.get() + 1);
		});
		sim.step();
		sim.step();
		assert_eq!(count.get(), 2);
		sim.stop();
		assert!(!sim.step());
		assert_eq!(count.get(), 2);
	}

	#[test]
	fn pinned_node_holds_position_and_resumes_after_unpin() {
		let nodes = [page("a"), page("b")];
		let links = [PageLink::new("a", "b")];
		let mut sim = Simulation::new(&nodes, &links, 800.0, 600.0, LayoutParams::default());
		settle(&mut sim);

		let a = sim.index_of("a").unwrap();
		let drag_target = sim.params().drag_alpha_target;
		sim.reheat(drag_target);
		sim.pin(a, 50.0, 40.0);
		for _ in 0..50 {
			sim.step();
			assert_eq!(sim.position("a"), Some((50.0, 40.0)));
		}

		sim.set_alpha_target(0.0);
		sim.unpin(a);
		sim.step();
		assert_ne!(sim.position("a"), Some((50.0, 40.0)));
		assert!(sim.node(a).unwrap().fx.is_none());
		settle(&mut sim);
	}

	#[test]
	fn reheat_restarts_a_resting_simulation() {
		let nodes = [page("a")];
		let mut sim = Simulation::new(&nodes, &[], 800.0, 600.0, LayoutParams::default());
		settle(&mut sim);
		sim.reheat(0.3);
		assert!(sim.step());
		assert!(sim.alpha() > 0.0);
	}
}
