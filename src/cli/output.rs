//! Output formatting for CLI

use crate::{ports::EvaluationResult, racetrack::Grid, types::Position};

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Format a fraction as a percentage
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Draw `trajectory` on the grid.
///
/// Each visited cell shows the index of the step that reached it, modulo
/// 10. Later visits overwrite earlier ones.
pub fn render_trajectory(grid: &Grid, trajectory: &[Position]) -> String {
    let mut canvas: Vec<Vec<char>> = grid
        .iter_rows()
        .map(|row| row.iter().map(|cell| cell.to_char()).collect())
        .collect();

    for (step, position) in trajectory.iter().enumerate() {
        if !grid.contains(*position) {
            continue;
        }
        let digit = char::from_digit((step % 10) as u32, 10).unwrap_or('*');
        canvas[position.row as usize][position.col as usize] = digit;
    }

    let mut rendered = String::with_capacity(grid.rows() * (grid.cols() + 1));
    for row in canvas {
        rendered.extend(row);
        rendered.push('\n');
    }
    rendered
}

/// Print evaluation statistics and the first run drawn on the grid
pub fn print_evaluation(grid: &Grid, runs: &[EvaluationResult]) {
    print_subsection("Evaluation");
    let finished = runs.iter().filter(|run| run.finished).count();
    print_kv("Runs", &format_number(runs.len()));
    print_kv("Finished", &format!("{} / {}", finished, runs.len()));
    if !runs.is_empty() {
        let steps: usize = runs.iter().map(|run| run.steps).sum();
        print_kv(
            "Mean steps",
            &format!("{:.2}", steps as f64 / runs.len() as f64),
        );
    }

    if let Some(run) = runs.first() {
        print_subsection(if run.finished {
            "Trajectory"
        } else {
            "Trajectory (did not finish)"
        });
        print!("{}", render_trajectory(grid, &run.trajectory));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_get_thousands_separators() {
        assert_eq!(format_number(7), "7");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn trajectory_marks_step_indices() {
        let grid: Grid = "5,5\n#####\n##F##\n##.##\n##S##\n#####\n".parse().unwrap();
        let trajectory = [Position::new(3, 2), Position::new(2, 2)];
        assert_eq!(
            render_trajectory(&grid, &trajectory),
            "#####\n##F##\n##1##\n##0##\n#####\n"
        );
    }

    #[test]
    fn trajectory_indices_wrap_at_ten() {
        let grid: Grid = "1,3\nS.F\n".parse().unwrap();
        let trajectory: Vec<Position> = (0..12)
            .map(|step| Position::new(0, if step == 11 { 1 } else { 0 }))
            .collect();
        assert_eq!(render_trajectory(&grid, &trajectory), "01F\n");
    }
}
