mod config;

fn main() {
    let answer = helper_function();
    println!("answer: {}", answer);
}

fn helper_function() -> i32 {
    config::BASE + 2
}
