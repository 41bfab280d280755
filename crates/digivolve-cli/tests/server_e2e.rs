use std::fs;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

const DATASET: &str = "\
Number,Image,Name,Stage,Attribute,Evolutions,
6,,Koromon,II,None,Agumon,
26,,Agumon,III,Vaccine,\"Greymon, Geo Greymon\",
76,,Greymon,IV,Vaccine,Metal Greymon,
77,,Geo Greymon,IV,Vaccine,,
120,,Metal Greymon,V,Vaccine,,
";

fn digivolve_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_digivolve"))
}

struct ChildGuard {
    child: Child,
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

struct HttpResponse {
    status: u16,
    head: String,
    body: String,
}

impl HttpResponse {
    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("parse JSON response")
    }
}

fn http_request(addr: &str, method: &str, path_and_query: &str) -> HttpResponse {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .ok();
    stream
        .set_write_timeout(Some(Duration::from_secs(5)))
        .ok();

    let request = format!(
        "{method} {path_and_query} HTTP/1.1\r\nHost: {addr}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).expect("write request");
    stream.flush().ok();

    let mut response_bytes = Vec::new();
    stream
        .read_to_end(&mut response_bytes)
        .expect("read response");
    let response = String::from_utf8_lossy(&response_bytes);

    let status = response
        .lines()
        .next()
        .unwrap_or("")
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(0);

    let (head, body) = response
        .split_once("\r\n\r\n")
        .unwrap_or(("", response.as_ref()));
    HttpResponse {
        status,
        head: head.to_string(),
        body: body.to_string(),
    }
}

fn get(addr: &str, path: &str) -> HttpResponse {
    http_request(addr, "GET", path)
}

fn start_server(data: &Path, ready_file: &Path) -> (ChildGuard, String) {
    let child = Command::new(digivolve_bin())
        .arg("serve")
        .arg("--data")
        .arg(data)
        .arg("--listen")
        .arg("127.0.0.1:0")
        .arg("--ready-file")
        .arg(ready_file)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn digivolve serve");
    let guard = ChildGuard { child };

    let deadline = Instant::now() + Duration::from_secs(20);
    while !ready_file.exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    assert!(ready_file.exists(), "server did not write ready file");

    let ready_text = fs::read_to_string(ready_file).expect("read ready file");
    let ready_json: serde_json::Value = serde_json::from_str(&ready_text).expect("parse ready json");
    let addr = ready_json["addr"]
        .as_str()
        .expect("ready.addr is string")
        .to_string();
    (guard, addr)
}

#[test]
fn server_answers_evolution_queries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("digimon_list.csv");
    fs::write(&data, DATASET).expect("write dataset");
    let (_guard, addr) = start_server(&data, &dir.path().join("ready.json"));

    let health = get(&addr, "/health");
    assert_eq!(health.status, 200);
    assert_eq!(health.json()["status"], "healthy");

    let index = get(&addr, "/");
    assert_eq!(index.status, 200);
    assert!(index.json()["endpoints"]["search_evolution"].is_string());

    // Found: transitive lineage in both directions.
    let agumon = get(&addr, "/api/evolution/agumon");
    assert_eq!(agumon.status, 200);
    assert!(agumon
        .head
        .to_ascii_lowercase()
        .contains("access-control-allow-origin: *"));
    let v = agumon.json();
    assert_eq!(v["success"], true);
    assert_eq!(v["total_results"], 1);
    let line = &v["results"][0];
    assert_eq!(line["digimon"]["name"], "Agumon");
    assert_eq!(line["previous_evolutions"][0]["name"], "Koromon");
    assert_eq!(line["evolution_summary"]["total_previous"], 1);
    assert_eq!(line["evolution_summary"]["total_next"], 3);

    // Percent-encoded names and a depth limit.
    let direct = get(&addr, "/api/evolution/AGUMON?depth=1").json();
    assert_eq!(direct["results"][0]["evolution_summary"]["total_next"], 2);
    let geo = get(&addr, "/api/evolution/Geo%20Greymon").json();
    assert_eq!(geo["results"][0]["previous_evolutions"][0]["name"], "Agumon");

    // Not found is a 404 with the normal response body.
    let missing = get(&addr, "/api/evolution/DigimonInexistente");
    assert_eq!(missing.status, 404);
    let v = missing.json();
    assert_eq!(v["success"], false);
    assert_eq!(v["message"], "Digimon not found: DigimonInexistente");
    assert_eq!(v["results"], serde_json::json!([]));

    let bad_depth = get(&addr, "/api/evolution/agumon?depth=many");
    assert_eq!(bad_depth.status, 400);

    let next = get(&addr, "/api/evolution/agumon/next").json();
    assert_eq!(next["total"], 2);
    assert_eq!(next["evolutions"][1]["name"], "Geo Greymon");

    let previous = get(&addr, "/api/evolution/Metal%20Greymon/previous").json();
    assert_eq!(previous["evolutions"][0]["name"], "Greymon");

    let summary = get(&addr, "/api/evolution/greymon/summary").json();
    assert_eq!(summary["summary"]["total_previous"], 2);
    assert_eq!(summary["summary"]["total_next"], 1);

    let yes = get(&addr, "/api/can-evolve/Agumon/Greymon").json();
    assert_eq!(yes["can_evolve"], true);
    let no = get(&addr, "/api/can-evolve/Agumon/Metal%20Greymon").json();
    assert_eq!(no["can_evolve"], false);
    assert_eq!(get(&addr, "/api/can-evolve/Nobodymon/Agumon").status, 404);
    assert_eq!(get(&addr, "/api/evolution/Nobodymon/next").status, 404);

    let unknown = get(&addr, "/nope");
    assert_eq!(unknown.status, 404);
    assert_eq!(unknown.json()["error"], "not found");

    let status = get(&addr, "/status").json();
    assert_eq!(status["digimon"], 5);
    assert_eq!(status["report"]["records"], 5);
}

#[test]
fn reload_swaps_dataset_and_keeps_old_one_on_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("digimon_list.csv");
    fs::write(&data, DATASET).expect("write dataset");
    let (_guard, addr) = start_server(&data, &dir.path().join("ready.json"));

    assert_eq!(get(&addr, "/api/evolution/War%20Greymon").status, 404);

    let extended = format!("{DATASET}180,,War Greymon,VI,Vaccine,,\n")
        .replace("120,,Metal Greymon,V,Vaccine,,", "120,,Metal Greymon,V,Vaccine,War Greymon,");
    fs::write(&data, extended).expect("rewrite dataset");

    let reload = http_request(&addr, "POST", "/admin/reload");
    assert_eq!(reload.status, 200);
    assert_eq!(reload.json()["report"]["records"], 6);

    let war = get(&addr, "/api/evolution/war%20greymon").json();
    assert_eq!(war["success"], true);
    assert_eq!(war["results"][0]["evolution_summary"]["total_previous"], 4);

    // Schema error: the previous dataset keeps serving.
    fs::write(&data, "Number,Name,Stage,Attribute\n1,Botamon,I,\n").expect("break dataset");
    let failed = http_request(&addr, "POST", "/admin/reload");
    assert_eq!(failed.status, 500);
    assert!(failed.json()["error"]
        .as_str()
        .unwrap_or_default()
        .contains("Evolutions"));
    assert_eq!(get(&addr, "/api/evolution/war%20greymon").status, 200);
}
