use golomb::bench::{BenchmarkLog, BenchmarkRow};
use golomb::ruler::MAX_LEN;
use golomb::search::{run_search, SearchConfig};

fn main() {
    let mut cfg = SearchConfig::default();
    let mut validate_only = false;
    let mut n: Option<usize> = None;
    let mut log_path: Option<String> = None;
    let mut description = String::new();

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--test" | "--validate" => {
                validate_only = true;
                i += 1;
            }
            "--max-len" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                cfg.max_len = v.parse().unwrap_or_else(|_| usage_and_exit(2));
                i += 2;
            }
            "--procs" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                cfg.procs = v.parse().unwrap_or_else(|_| usage_and_exit(2));
                i += 2;
            }
            "--threads" | "--workers" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                cfg.threads_per_proc = v.parse().unwrap_or_else(|_| usage_and_exit(2));
                i += 2;
            }
            "--round-size" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                cfg.round_size = v.parse().unwrap_or_else(|_| usage_and_exit(2));
                i += 2;
            }
            "--depth" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                cfg.prefix_depth = Some(v.parse().unwrap_or_else(|_| usage_and_exit(2)));
                i += 2;
            }
            "--greedy" => {
                cfg.greedy_warm_start = true;
                i += 1;
            }
            "--log" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                log_path = Some(v.clone());
                i += 2;
            }
            "--describe" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                description = v.clone();
                i += 2;
            }
            "--help" | "-h" => usage_and_exit(0),
            arg => {
                if n.is_some() {
                    usage_and_exit(2);
                }
                n = Some(arg.parse().unwrap_or_else(|_| usage_and_exit(2)));
                i += 1;
            }
        }
    }

    if validate_only {
        match golomb::validate::validate_known_rulers() {
            Ok(()) => {
                println!("Validation OK: engine reproduces published optima.");
                return;
            }
            Err(e) => {
                eprintln!("Validation FAILED: {e}");
                std::process::exit(1);
            }
        }
    }

    if let Some(n) = n {
        cfg.n = n;
    }

    println!("===========================================");
    println!(" GOLOMB RULER SEARCH");
    println!("===========================================");
    println!(
        "Searching for optimal Golomb ruler with n = {} marks (length cap {})",
        cfg.n, cfg.max_len
    );
    println!("Ranks: {}", cfg.procs);
    println!("Threads per rank: {}", cfg.threads_per_proc);
    println!("Total workers: {}", cfg.procs * cfg.threads_per_proc);
    println!();

    let start = std::time::Instant::now();
    let report = match run_search(&cfg) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };
    let elapsed = start.elapsed().as_secs_f64();

    println!("===========================================");
    println!("RESULTS");
    println!("===========================================");

    let length = match &report.ruler {
        None => {
            println!("No solution found within max length = {}", cfg.max_len);
            -1
        }
        Some(ruler) => {
            println!("Optimal ruler found!");
            println!("Length   : {}", ruler.length);
            let marks: Vec<String> = ruler.marks.iter().map(ToString::to_string).collect();
            println!("Marks    : [{}]", marks.join(", "));

            if let Some(expected) = golomb::ruler::known_optimal(cfg.n) {
                if cfg.max_len >= expected && ruler.length != expected {
                    println!("WARNING: Expected length {expected} but got {}", ruler.length);
                }
            }
            ruler.length
        }
    };

    println!();
    println!("Time     : {elapsed:.3} seconds");
    println!("States   : {}", report.states_explored);
    print_throughput(report.states_explored as f64 / elapsed);

    if let Some(path) = log_path {
        let row = BenchmarkRow {
            n: cfg.n,
            procs: cfg.procs,
            threads_per_proc: cfg.threads_per_proc,
            length,
            time_s: elapsed,
            states: report.states_explored,
            description: &description,
        };
        let log = BenchmarkLog::new(&path);
        if let Err(e) = log.append(&row) {
            eprintln!(
                "Warning: could not append benchmark row to {}: {e}",
                log.path().display()
            );
        }
    }
}

fn print_throughput(states_per_sec: f64) {
    if states_per_sec >= 1e9 {
        println!("States/sec: {:.2} G/s", states_per_sec / 1e9);
    } else if states_per_sec >= 1e6 {
        println!("States/sec: {:.2} M/s", states_per_sec / 1e6);
    } else {
        println!("States/sec: {states_per_sec:.0}");
    }
}

fn usage_and_exit(code: i32) -> ! {
    eprintln!(
        "Usage:\n  golomb [N] [--max-len L] [--procs P] [--threads T] [--round-size S] [--depth D] [--greedy] [--log FILE] [--describe TEXT]\n  golomb --test\n\nOptions:\n  N                   Ruler order, 2..=24 (default: 11)\n  --max-len L         Length cap, 0..={MAX_LEN} (default: {MAX_LEN})\n  --procs P           Rank count (default: 1)\n  --threads/--workers T  Worker threads per rank (default: auto-detect)\n  --round-size S      Prefixes between bound synchronizations (default: 64)\n  --depth D           Prefix depth override\n  --greedy            Seed the bound with a greedy feasible ruler\n  --log FILE          Append a benchmark CSV row to FILE\n  --describe TEXT     Description column for the benchmark row\n  --test/--validate   Validate against published optima (fast, deterministic)\n"
    );
    std::process::exit(code)
}
